mod clip;
mod filename;
mod game;

pub use clip::{ClipMetadata, ResolvedClip};
pub use filename::{clip_file_name, parse_clip_file_name, sanitize_broadcaster};
pub use game::GameId;
