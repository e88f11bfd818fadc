use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use config::{Config, Environment, File, FileFormat};
use miette::{Context, IntoDiagnostic, Result};
use serde::Deserialize;

use crate::outside::CHROMEDRIVER;

/// Default configuration file, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "clipreel.toml";

/// Runtime settings, merged from the defaults, the TOML file and the
/// `CLIPREEL_*` environment
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Client-ID header sent with every catalogue request
    pub client_id: String,
    /// Clips listing endpoint
    pub catalogue_url: String,
    /// How many clips to ask the catalogue for
    pub max_clips: u32,
    /// How many days back the listing window starts
    pub lookback_days: u32,
    /// Stop selecting clips once their total duration exceeds this
    pub duration_threshold_secs: u64,
    /// Fixed number of download worker threads
    pub worker_count: usize,
    /// Size of the copy buffer used while streaming a clip to disk
    pub chunk_size_bytes: usize,
    /// Directory receiving the downloaded clips
    pub clips_dir: PathBuf,
    /// How long the resolver waits for a clip page to expose its player
    pub resolve_timeout_secs: u64,
    /// The chromedriver binary to spawn for the resolution phase
    pub chromedriver_bin: String,
    /// Where the stitched reel is written
    pub output_file: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            catalogue_url: "https://api.twitch.tv/helix/clips".to_owned(),
            max_clips: 50,
            lookback_days: 7,
            duration_threshold_secs: 90,
            worker_count: 4,
            chunk_size_bytes: 1 << 20,
            clips_dir: PathBuf::from("clips"),
            resolve_timeout_secs: 10,
            chromedriver_bin: CHROMEDRIVER.to_owned(),
            output_file: PathBuf::from("highlights.mp4"),
        }
    }
}

impl Settings {
    /// Load the settings, layering the file under the environment.
    /// A file passed explicitly must exist, the default one may be absent.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => File::from(path).format(FileFormat::Toml).required(true),
            None => File::new(DEFAULT_CONFIG_FILE, FileFormat::Toml).required(false),
        };

        let config = Config::builder()
            .add_source(file)
            .add_source(Environment::with_prefix("CLIPREEL"))
            .build()
            .into_diagnostic()
            .wrap_err("Could not load the configuration")?;

        config
            .try_deserialize()
            .into_diagnostic()
            .wrap_err("Could not parse the configuration")
    }

    pub fn resolve_timeout(&self) -> Duration {
        Duration::from_secs(self.resolve_timeout_secs)
    }
}
