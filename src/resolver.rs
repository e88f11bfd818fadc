use std::{cell::Cell, time::Duration};

use tracing::{debug, error, warn};

use crate::{
    outside::BrowserSession,
    result::{Error, Result},
    types::{ClipMetadata, ResolvedClip},
};

/// CSS selector of the player's media element, once a source has been attached
pub const MEDIA_SELECTOR: &str = "video[src]";
pub const MEDIA_ATTRIBUTE: &str = "src";

/// CSS selector of the player slider whose upper bound is the clip duration
pub const DURATION_SELECTOR: &str = "div.player-slider[aria-valuemax]";
pub const DURATION_ATTRIBUTE: &str = "aria-valuemax";

/// Turns catalogue entries into direct media streams by loading each clip
/// page in the browser and scraping the player
pub struct LinkResolver<'a> {
    session: &'a dyn BrowserSession,
    timeout: Duration,
    skipped: Cell<usize>,
}

impl<'a> LinkResolver<'a> {
    pub fn new(session: &'a dyn BrowserSession, timeout: Duration) -> Self {
        Self {
            session,
            timeout,
            skipped: Cell::new(0),
        }
    }

    /// Resolve a single catalogue entry into its stream URL and duration
    pub fn resolve(&self, clip: &ClipMetadata) -> Result<ResolvedClip> {
        self.session
            .navigate(&clip.page_url)
            .map_err(|err| err.wrap_err_with(|| format!("Could not load the page of {clip}")))?;

        let media = self.session.wait_for_selector(MEDIA_SELECTOR, self.timeout)?;
        let media_url = self.session.read_attribute(&media, MEDIA_ATTRIBUTE)?;
        if media_url.is_empty() {
            return Err(Error::UnresolvedMedia("the media source is empty".to_owned()));
        }

        let slider = self.session.wait_for_selector(DURATION_SELECTOR, self.timeout)?;
        let raw = self.session.read_attribute(&slider, DURATION_ATTRIBUTE)?;
        // The slider exposes fractional seconds, truncating keeps a lower bound
        let duration_secs = raw
            .parse::<f64>()
            .ok()
            .filter(|secs| secs.is_finite())
            .ok_or_else(|| Error::UnresolvedMedia(format!("'{raw}' is not a duration")))?
            as u64;

        Ok(ResolvedClip {
            clip: clip.clone(),
            media_url,
            duration_secs,
        })
    }

    /// Resolve entries one at a time, skipping those whose media cannot be
    /// located. Lazy: an entry is only visited when the iterator reaches it,
    /// so a short selection never pays for the entries behind it.
    pub fn resolve_stream(
        &'a self,
        clips: Vec<ClipMetadata>,
    ) -> impl Iterator<Item = ResolvedClip> + 'a {
        clips
            .into_iter()
            .filter_map(move |clip| match self.resolve(&clip) {
                Ok(resolved) => {
                    debug!("Resolved {clip} to a {}s stream", resolved.duration_secs);
                    Some(resolved)
                }
                Err(Error::UnresolvedMedia(reason)) => {
                    warn!("Skipping {clip}: {reason}");
                    self.skipped.set(self.skipped.get() + 1);
                    None
                }
                Err(Error::Miette(report)) => {
                    error!("Skipping {clip}: {report}");
                    self.skipped.set(self.skipped.get() + 1);
                    None
                }
            })
    }

    /// How many entries [`Self::resolve_stream`] has skipped so far
    pub fn skipped(&self) -> usize {
        self.skipped.get()
    }
}
