use std::fmt::Display;

use serde::Deserialize;

/// One catalogue entry, as returned by the clips listing.
/// The listing order is the catalogue's relevance order and is preserved
/// through the whole pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClipMetadata {
    pub id: String,
    pub broadcaster_name: String,
    pub title: String,

    /// Public page of the clip, not the media stream itself
    #[serde(rename = "url")]
    pub page_url: String,
}

impl Display for ClipMetadata {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "'{}' by {}", self.title, self.broadcaster_name)
    }
}

/// A clip whose direct media stream has been located on its page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedClip {
    pub clip: ClipMetadata,
    pub media_url: String,
    pub duration_secs: u64,
}
