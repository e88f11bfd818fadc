use std::path::PathBuf;

use clap::Parser;

use crate::types::GameId;

macro_rules! arg_env {
    ($v:literal) => {
        concat!("CLIPREEL_", $v)
    };
}

/// Curate a highlight reel out of a game's top Twitch clips.
/// Fetch the most viewed clips of the window, resolve their media streams
/// and download them in parallel.
#[derive(Parser, Debug)]
pub struct Args {
    /// The game whose top clips to fetch:
    /// a known alias (`fortnite`, `apex`) or a raw catalogue id
    #[clap(env=arg_env!("GAME"))]
    pub game: GameId,

    /// The path to the configuration file
    #[clap(long, env=arg_env!("CONFIG"))]
    pub config: Option<PathBuf>,

    /// Override the directory receiving the downloaded clips
    #[clap(long, env=arg_env!("CLIPS_DIR"))]
    pub clips_dir: Option<PathBuf>,

    /// Override how many days back the listing window starts
    #[clap(long, env=arg_env!("DAYS"))]
    pub days: Option<u32>,

    /// Stitch the downloaded clips into a single credited reel afterwards
    #[clap(long, env=arg_env!("STITCH"))]
    pub stitch: bool,

    /// Print more logs, once for debug, twice for trace
    #[clap(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    pub fn log_level(&self) -> tracing::Level {
        match self.verbose {
            0 => tracing::Level::INFO,
            1 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn the_command_definition_is_consistent() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }

    #[test]
    fn parses_a_game_alias() {
        let args = Args::try_parse_from(["clipreel", "fortnite"]).unwrap();
        assert_eq!(args.game, GameId::FORTNITE);
        assert!(!args.stitch);
        assert_eq!(args.days, None);
    }

    #[test]
    fn parses_overrides() {
        let args = Args::try_parse_from([
            "clipreel",
            "511224",
            "--days",
            "3",
            "--clips-dir",
            "elsewhere",
            "--stitch",
        ])
        .unwrap();

        assert_eq!(args.game, GameId::APEX_LEGENDS);
        assert_eq!(args.days, Some(3));
        assert_eq!(args.clips_dir, Some(PathBuf::from("elsewhere")));
        assert!(args.stitch);
    }

    #[test]
    fn log_level_follows_verbosity() {
        let quiet = Args::try_parse_from(["clipreel", "fortnite"]).unwrap();
        assert_eq!(quiet.log_level(), tracing::Level::INFO);

        let verbose = Args::try_parse_from(["clipreel", "fortnite", "-v"]).unwrap();
        assert_eq!(verbose.log_level(), tracing::Level::DEBUG);

        let chatty = Args::try_parse_from(["clipreel", "fortnite", "-vvv"]).unwrap();
        assert_eq!(chatty.log_level(), tracing::Level::TRACE);
    }

    #[test]
    fn rejects_an_unknown_game() {
        assert!(Args::try_parse_from(["clipreel", "minesweeper"]).is_err());
    }
}
