mod catalogue;
mod cli;
mod config;
mod download;
mod logging;
mod outside;
mod progress;
mod resolver;
mod result;
mod selection;
mod stitch;
#[cfg(test)]
mod testing;
mod types;

use std::time::Duration;

use clap::Parser;
use miette::{miette, Result};
use tracing::{info, warn};

use crate::{
    catalogue::Catalogue,
    cli::Args,
    config::Settings,
    download::{ClipOutcome, Downloader},
    outside::{ChromeDriver, Ffmpeg, WebDriver},
    resolver::LinkResolver,
    selection::{select_clips, Selection},
    stitch::build_reel,
    types::ClipMetadata,
};

fn main() -> Result<()> {
    // Initialize the CLI, logging and configuration
    let args = Args::parse();
    logging::init_logging(args.log_level())?;

    let mut settings = Settings::load(args.config.as_deref())?;
    if let Some(clips_dir) = &args.clips_dir {
        settings.clips_dir = clips_dir.clone();
    }
    if let Some(days) = args.days {
        settings.lookback_days = days;
    }
    if settings.client_id.is_empty() {
        return Err(miette!(
            help = "set client_id in clipreel.toml or export CLIPREEL_CLIENT_ID",
            "No catalogue client id configured"
        ));
    }

    // List the candidate clips
    let catalogue = Catalogue::new(&settings.catalogue_url, &settings.client_id);
    let started_at = catalogue::window_start(settings.lookback_days)?;
    info!(
        "Fetching the top {} clips of game {} since {started_at}",
        settings.max_clips, args.game
    );
    let clips = catalogue.top_clips(args.game, &started_at, settings.max_clips)?;
    if clips.is_empty() {
        info!("The catalogue listed no clips, nothing to do");
        return Ok(());
    }

    // Resolve clip pages into streams until the selection is full
    let selection = resolve_selection(&settings, clips)?;
    info!(
        "{} clips selected, {}s of footage",
        selection.len(),
        selection.total_secs()
    );
    if selection.is_empty() {
        warn!("No clip could be resolved, stopping here");
        return Ok(());
    }

    // Download the batch
    let downloader = Downloader::new(
        &settings.clips_dir,
        settings.worker_count,
        settings.chunk_size_bytes,
    );
    let outcomes = downloader.run(&selection)?;
    report(&settings, &outcomes);

    if args.stitch {
        let ffmpeg = Ffmpeg::new()?;
        build_reel(&ffmpeg, &settings.clips_dir, &settings.output_file)?;
    }

    Ok(())
}

/// Resolution phase. The spawned driver and its browser session only live
/// for the duration of this function, both are gone before any download starts.
fn resolve_selection(settings: &Settings, clips: Vec<ClipMetadata>) -> Result<Selection> {
    let agent = ureq::AgentBuilder::new()
        .timeout(Duration::from_secs(60))
        .build();

    let driver = ChromeDriver::spawn(&settings.chromedriver_bin, &agent)?;
    let session = WebDriver::open(agent, &driver.url())?;

    let resolver = LinkResolver::new(&session, settings.resolve_timeout());
    let selection = select_clips(
        resolver.resolve_stream(clips),
        settings.duration_threshold_secs,
    );
    if resolver.skipped() > 0 {
        info!("{} clips skipped during resolution", resolver.skipped());
    }

    if let Err(report) = session.close() {
        warn!("Browser session not closed cleanly: {report}");
    }

    Ok(selection)
}

/// Final account of the batch
fn report(settings: &Settings, outcomes: &[ClipOutcome]) {
    let succeeded = outcomes.iter().filter(|outcome| outcome.succeeded()).count();
    info!(
        "{succeeded}/{} clips downloaded into '{}'",
        outcomes.len(),
        settings.clips_dir.display()
    );

    for outcome in outcomes {
        if let Err(kind) = &outcome.result {
            warn!(
                "Clip {} by {}: {kind}",
                outcome.index, outcome.broadcaster
            );
        }
    }
}
