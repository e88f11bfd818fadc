use std::{
    process::{Child, Command, Stdio},
    thread,
    time::Duration,
};

use miette::{miette, Context, IntoDiagnostic, Result};
use tracing::debug;

use super::command::{run_command, Capture};

/// How long the driver gets to start accepting connections
const STARTUP_TIMEOUT: Duration = Duration::from_secs(5);
const STARTUP_POLL: Duration = Duration::from_millis(250);

/// A chromedriver process owned by this run.
/// Spawned on a random local port, killed when the handle is dropped.
pub struct ChromeDriver {
    child: Child,
    port: u16,
}

impl ChromeDriver {
    /// Verify the binary is reachable, then spawn it and wait for its
    /// status endpoint to come up
    pub fn spawn(binary: &str, agent: &ureq::Agent) -> Result<Self> {
        let res = run_command(binary, |cmd| cmd.arg("--version"), Capture::STDOUT)?;
        if !res.status.success() {
            return Err(miette!(
                help = "the resolution phase drives a headless Chrome through it",
                "'{binary} --version' was not successful, is chromedriver installed?"
            ));
        }
        let version = String::from_utf8_lossy(&res.stdout);
        debug!("Using {}", version.lines().next().unwrap_or(binary).trim());

        let port = fastrand::u16(20000..60000);
        let child = Command::new(binary)
            .arg(format!("--port={port}"))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .into_diagnostic()
            .wrap_err_with(|| format!("Could not spawn '{binary}'"))?;

        let driver = Self { child, port };
        driver.await_ready(agent)?;
        debug!("'{binary}' listening on port {port}");
        Ok(driver)
    }

    /// Base URL of the WebDriver endpoint
    pub fn url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    fn await_ready(&self, agent: &ureq::Agent) -> Result<()> {
        let status_url = format!("{}/status", self.url());
        let mut waited = Duration::ZERO;
        while waited < STARTUP_TIMEOUT {
            if agent.get(&status_url).call().is_ok() {
                return Ok(());
            }
            thread::sleep(STARTUP_POLL);
            waited += STARTUP_POLL;
        }
        Err(miette!(
            "chromedriver did not come up on port {} within {}s",
            self.port,
            STARTUP_TIMEOUT.as_secs()
        ))
    }
}

impl Drop for ChromeDriver {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
