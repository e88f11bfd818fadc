use std::ops::Deref;

use tracing::debug;

use crate::types::ResolvedClip;

/// The ordered prefix of resolved clips admitted into the batch
#[derive(Debug, Default)]
pub struct Selection(Vec<ResolvedClip>);

impl Selection {
    /// Total footage of the selected clips, in seconds
    pub fn total_secs(&self) -> u64 {
        self.iter()
            .map(|clip| clip.duration_secs)
            .fold(0, u64::saturating_add)
    }
}

impl Deref for Selection {
    type Target = Vec<ResolvedClip>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Accumulate resolved clips in order until the running total of their
/// durations exceeds the threshold.
///
/// The clip that crosses the threshold is included, so the reel never comes
/// up short. A total exactly on the threshold does not stop the accumulation.
pub fn select_clips(
    resolved: impl IntoIterator<Item = ResolvedClip>,
    threshold_secs: u64,
) -> Selection {
    let mut clips = Vec::new();
    let mut total = 0u64;

    for clip in resolved {
        // An extreme duration saturates the total instead of wrapping it
        total = total.saturating_add(clip.duration_secs);
        clips.push(clip);
        if total > threshold_secs {
            debug!("Selection full at {total}s");
            break;
        }
    }

    Selection(clips)
}
