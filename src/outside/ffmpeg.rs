use std::{ffi::OsStr, fmt::Debug, path::Path};

use miette::Result;

use super::command::{assert_success_command, FFMPEG, FF_DEFAULT_ARGS};

/// The video operations the reel builder needs.
/// [`Ffmpeg`] is the real implementation, tests substitute their own.
pub trait Stitcher: Debug {
    /// Re-emit a clip with the credit text burnt into its bottom-left corner
    fn overlay_credit(&self, input: &Path, output: &Path, credit: &str) -> Result<()>;

    /// Concatenate the files listed in the concat manifest into one video
    fn concatenate(&self, manifest: &Path, output: &Path) -> Result<()>;
}

/// Interface for the [ffmpeg](https://ffmpeg.org) program
#[derive(Debug)]
pub struct Ffmpeg;

impl Ffmpeg {
    /// Verify that the `ffmpeg` binary is reachable
    pub fn new() -> Result<Self> {
        assert_success_command(FFMPEG, |cmd| cmd.arg("-version"))?;

        Ok(Self)
    }
}

impl Stitcher for Ffmpeg {
    fn overlay_credit(&self, input: &Path, output: &Path, credit: &str) -> Result<()> {
        let filter = drawtext_filter(credit);
        assert_success_command(FFMPEG, |cmd| {
            cmd.args(FF_DEFAULT_ARGS)
                .arg("-y")
                .args([OsStr::new("-i"), input.as_os_str()])
                .args(["-vf", filter.as_str()])
                .args(["-c:a", "copy"])
                .arg(output)
        })
    }

    fn concatenate(&self, manifest: &Path, output: &Path) -> Result<()> {
        assert_success_command(FFMPEG, |cmd| {
            cmd.args(FF_DEFAULT_ARGS)
                .arg("-y")
                .args(["-f", "concat", "-safe", "0"])
                .args([OsStr::new("-i"), manifest.as_os_str()])
                // The credited intermediates share one encoding, stream copy is enough
                .args(["-c", "copy"])
                .arg(output)
        })
    }
}

/// Build the drawtext filter burning the credit into the frame
fn drawtext_filter(credit: &str) -> String {
    // Inside the quoted drawtext value, the quote, backslash, colon and
    // percent would otherwise be interpreted by the filter parser
    let mut text = String::with_capacity(credit.len());
    for c in credit.chars() {
        if matches!(c, '\'' | '\\' | ':' | '%') {
            text.push('\\');
        }
        text.push(c);
    }

    format!(
        "drawtext=text='{text}':fontsize=40:fontcolor=white:\
        box=1:boxcolor=black@0.5:x=10:y=h-text_h-10"
    )
}
