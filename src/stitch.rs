use std::{
    fs,
    path::{Path, PathBuf},
};

use miette::{miette, Context, IntoDiagnostic, Result};
use tracing::{debug, info, warn};

use crate::{outside::Stitcher, types::parse_clip_file_name};

/// Assemble the downloaded clips into a single credited reel.
///
/// Clip files carry their batch position and broadcaster in their names,
/// so the reel follows the batch order and credits every broadcaster
/// in their own segment.
pub fn build_reel(stitcher: &dyn Stitcher, clips_dir: &Path, output: &Path) -> Result<()> {
    let mut clips = indexed_clips(clips_dir)?;
    if clips.is_empty() {
        return Err(miette!(
            "No clip files found in '{}', nothing to stitch",
            clips_dir.display()
        ));
    }
    clips.sort_unstable_by_key(|(index, _, _)| *index);

    let workdir = tempfile::tempdir()
        .into_diagnostic()
        .wrap_err("Could not create a working directory")?;

    // Burn each broadcaster credit into its clip first
    let mut credited_files = Vec::with_capacity(clips.len());
    for (index, broadcaster, path) in &clips {
        let credited = workdir.path().join(format!("{index}.mp4"));
        debug!("Crediting clip {index} to {broadcaster}");
        stitcher.overlay_credit(path, &credited, &format!("twitch.tv/{broadcaster}"))?;
        credited_files.push(credited);
    }

    let manifest = workdir.path().join("reel.txt");
    fs::write(&manifest, concat_manifest(&credited_files))
        .into_diagnostic()
        .wrap_err("Could not write the concat manifest")?;

    stitcher.concatenate(&manifest, output)?;
    info!("Stitched {} clips into '{}'", clips.len(), output.display());
    Ok(())
}

/// The clip files of the directory with their batch positions, unsorted.
/// Files with foreign names are reported and left out.
fn indexed_clips(dir: &Path) -> Result<Vec<(usize, String, PathBuf)>> {
    let mut clips = Vec::new();

    let entries = dir
        .read_dir()
        .into_diagnostic()
        .wrap_err_with(|| format!("Could not read '{}'", dir.display()))?;
    for entry in entries {
        let entry = entry.into_diagnostic()?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        match entry.file_name().to_str().and_then(parse_clip_file_name) {
            Some((index, broadcaster)) => clips.push((index, broadcaster, path)),
            None => warn!("Ignoring foreign file '{}'", path.display()),
        }
    }

    Ok(clips)
}

/// The ffmpeg concat demuxer manifest: one quoted path per line
fn concat_manifest(files: &[PathBuf]) -> String {
    files
        .iter()
        .map(|path| {
            // A quote inside the path is spliced around the quoting
            let escaped = path.display().to_string().replace('\'', r"'\''");
            format!("file '{escaped}'\n")
        })
        .collect()
}
