use std::process::{Command, Output, Stdio};

use bitflags::bitflags;
use miette::{miette, Context, IntoDiagnostic, Result};
use tracing::{debug, trace};

pub const CHROMEDRIVER: &str = "chromedriver";
pub const FFMPEG: &str = "ffmpeg";
pub const FF_DEFAULT_ARGS: [&str; 3] = ["-hide_banner", "-loglevel", "error"];

bitflags! {
    #[derive(Debug, Clone, Copy)]
    pub struct Capture: u8 {
        const STDIN = 0b0000001;
        const STDOUT = 0b0000010;
        const STDERR = 0b0000100;
    }
}

/// Run a command to completion, returning its raw output handle.
///
/// IO handles will be captured only if the caller required it or if the log level is Debug.
/// In that last case, `stdout` and `stderr` will be logged.
///
/// The function returns an error only if the command failed to execute.
/// If the program runs but returns a non-0 status code, it will not trigger an error.
pub fn run_command<F: FnOnce(&mut Command) -> &mut Command>(
    program: &str,
    f: F,
    capture: Capture,
) -> Result<Output> {
    let is_debug = tracing::enabled!(tracing::Level::DEBUG);
    let get_io = |capture| {
        if capture {
            Stdio::piped()
        } else {
            Stdio::null()
        }
    };

    let mut cmd = Command::new(program);
    let cmd = f(&mut cmd)
        .stdin(get_io(capture.contains(Capture::STDIN)))
        .stdout(get_io(is_debug || capture.contains(Capture::STDOUT)))
        .stderr(get_io(is_debug || capture.contains(Capture::STDERR)));

    debug!("Executing command: {cmd:?}");
    let res = cmd
        .output()
        .into_diagnostic()
        .wrap_err_with(|| format!("Could not execute '{program}'"))?;

    if is_debug {
        debug!("status: {}", res.status);
        debug!("stdout: {} bytes long", res.stdout.len());
        trace!("stdout: {:?}", String::from_utf8_lossy(&res.stdout));
        debug!("stderr: {} bytes long", res.stderr.len());
        trace!("stderr: {:?}", String::from_utf8_lossy(&res.stderr));
    }

    Ok(res)
}

/// Run the command and verify that it has returned a success status code.
pub fn assert_success_command<F: FnOnce(&mut Command) -> &mut Command>(
    program: &str,
    f: F,
) -> Result<()> {
    let res = run_command(program, f, Capture::empty())?;
    if res.status.success() {
        Ok(())
    } else {
        Err(miette!("'{program}' did run but was not successful"))
    }
}
