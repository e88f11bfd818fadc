use std::{
    fs,
    io::{Read, Write},
    ops::Range,
    path::{Path, PathBuf},
    thread,
    time::Duration,
};

use crossbeam_channel::{unbounded, Sender};
use miette::{Context, IntoDiagnostic, Result};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::{
    progress::Progress,
    selection::Selection,
    types::{clip_file_name, ResolvedClip},
};

/// Why a clip failed to land on disk
#[derive(Debug)]
pub enum FailureKind {
    /// The stream could not be fetched off the network
    Download(String),
    /// The stream arrived but could not be written out
    FileSystem(String),
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::Download(reason) => write!(f, "download failed: {reason}"),
            FailureKind::FileSystem(reason) => write!(f, "file write failed: {reason}"),
        }
    }
}

/// Terminal state of one clip of the batch
#[derive(Debug)]
pub struct ClipOutcome {
    pub index: usize,
    pub broadcaster: String,
    pub result: std::result::Result<u64, FailureKind>,
}

impl ClipOutcome {
    pub fn succeeded(&self) -> bool {
        self.result.is_ok()
    }
}

/// Downloads a selection into the clips directory over a fixed pool
/// of worker threads
pub struct Downloader {
    agent: ureq::Agent,
    dest: PathBuf,
    workers: usize,
    chunk_size: usize,
}

impl Downloader {
    pub fn new(dest: &Path, workers: usize, chunk_size: usize) -> Self {
        Self {
            agent: ureq::AgentBuilder::new()
                .timeout_connect(Duration::from_secs(10))
                .timeout_read(Duration::from_secs(30))
                .build(),
            dest: dest.to_owned(),
            workers: workers.max(1),
            chunk_size: chunk_size.max(1),
        }
    }

    /// Reset the clips directory, then download the whole selection.
    /// Per-clip failures land in the outcomes, not in the returned error.
    pub fn run(&self, selection: &Selection) -> Result<Vec<ClipOutcome>> {
        reset_dir(&self.dest)?;

        let progress = Progress::new(selection.len());
        let ranges = partition(selection.len(), self.workers);
        info!(
            "Downloading {} clips using {} workers, up to {} clips each",
            selection.len(),
            self.workers,
            selection.len().div_ceil(self.workers),
        );

        let (tx, rx) = unbounded();
        thread::scope(|scope| -> Result<()> {
            for (id, range) in ranges.into_iter().enumerate() {
                let tx = tx.clone();
                let progress = &progress;
                thread::Builder::new()
                    .name(format!("dl-{id}"))
                    .spawn_scoped(scope, move || {
                        self.download_range(range, selection, progress, &tx)
                    })
                    .into_diagnostic()
                    .wrap_err("Could not spawn a download worker")?;
            }
            Ok(())
        })?;
        drop(tx);

        let mut outcomes: Vec<ClipOutcome> = rx.try_iter().collect();
        outcomes.sort_unstable_by_key(|outcome| outcome.index);
        Ok(outcomes)
    }

    /// Worker body: walk a contiguous index range and report every outcome
    fn download_range(
        &self,
        range: Range<usize>,
        selection: &Selection,
        progress: &Progress,
        outcomes: &Sender<ClipOutcome>,
    ) {
        debug!("Worker started for clips {range:?}");

        for index in range {
            let clip = &selection[index];
            let result = self.fetch_clip(index, clip);
            match &result {
                Ok(bytes) => debug!("Clip {index} saved, {bytes} bytes"),
                Err(kind) => warn!("Clip {index} by {}: {kind}", clip.clip.broadcaster_name),
            }

            // Failed clips still move the counter, it tracks completion
            info!(
                "{}/{} clips downloaded",
                progress.finish_one(),
                progress.total()
            );

            outcomes
                .send(ClipOutcome {
                    index,
                    broadcaster: clip.clip.broadcaster_name.clone(),
                    result,
                })
                .unwrap();
        }

        debug!("Worker done");
    }

    /// Stream one clip into a temporary file in bounded-size chunks, then
    /// move it to its final name. A clip that fails mid-stream leaves
    /// nothing behind, dropping the temporary file deletes it.
    fn fetch_clip(
        &self,
        index: usize,
        clip: &ResolvedClip,
    ) -> std::result::Result<u64, FailureKind> {
        let response = self
            .agent
            .get(&clip.media_url)
            .call()
            .map_err(|err| FailureKind::Download(err.to_string()))?;

        // Created in the clips directory itself, the final rename never
        // crosses a filesystem
        let mut file = NamedTempFile::new_in(&self.dest)
            .map_err(|err| FailureKind::FileSystem(err.to_string()))?;

        let mut reader = response.into_reader();
        let mut chunk = vec![0u8; self.chunk_size];
        let mut written = 0u64;
        loop {
            let read = reader
                .read(&mut chunk)
                .map_err(|err| FailureKind::Download(err.to_string()))?;
            if read == 0 {
                break;
            }
            file.write_all(&chunk[..read])
                .map_err(|err| FailureKind::FileSystem(err.to_string()))?;
            written += read as u64;
        }

        let path = self
            .dest
            .join(clip_file_name(index, &clip.clip.broadcaster_name));
        file.persist(&path)
            .map_err(|err| FailureKind::FileSystem(err.to_string()))?;

        Ok(written)
    }
}

/// Split `count` items into contiguous ranges of ceil(count/workers) items.
/// Trailing ranges may come up empty, their workers just exit.
pub fn partition(count: usize, workers: usize) -> Vec<Range<usize>> {
    let workers = workers.max(1);
    let per_worker = count.div_ceil(workers);

    (0..workers)
        .map(|i| {
            let start = (i * per_worker).min(count);
            let end = (start + per_worker).min(count);
            start..end
        })
        .collect()
}

/// Create the directory if needed and delete every file already inside.
/// Failing to reset is fatal: stale clips would bleed into the new reel.
pub fn reset_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)
        .into_diagnostic()
        .wrap_err_with(|| format!("Could not create '{}'", dir.display()))?;

    for entry in dir.read_dir().into_diagnostic()? {
        let path = entry.into_diagnostic()?.path();
        if path.is_file() {
            debug!("Deleting old file '{}'", path.display());
            fs::remove_file(&path)
                .into_diagnostic()
                .wrap_err_with(|| format!("Could not delete '{}'", path.display()))?;
        }
    }

    Ok(())
}
