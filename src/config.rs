use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, ValueEnum};
use serde::Serialize;

use crate::error::Result;

// ============================================================================
// Engine Configuration
// ============================================================================

/// How cleared lines turn into points.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, ValueEnum, Serialize)]
pub enum LineScoring {
    /// 100 points per complete row or column; crossing lines both count.
    #[default]
    PerLine,
    /// 100 points per distinct cleared cell coordinate (legacy scoring).
    PerCell,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct GameConfig {
    pub scoring: LineScoring,
}

// ============================================================================
// Command Line
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "shape-sorter", version, about = "Place shapes, clear lines")]
pub struct Cli {
    /// Seed for a reproducible game. A fresh one is generated if omitted.
    #[arg(long, env = "SHAPE_SORTER_SEED")]
    pub seed: Option<String>,

    /// Line scoring rule.
    #[arg(long, value_enum, env = "SHAPE_SORTER_SCORING", default_value_t = LineScoring::PerLine)]
    pub scoring: LineScoring,

    /// Pause after a placement before lines are checked.
    #[arg(long, value_name = "ms", default_value_t = 400)]
    pub settle_ms: u64,

    /// How long completed lines stay highlighted before they clear.
    #[arg(long, value_name = "ms", default_value_t = 800)]
    pub clear_ms: u64,

    /// Write logs to this file (the terminal is owned by the UI).
    #[arg(long, env = "SHAPE_SORTER_LOG")]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    pub fn game_config(&self) -> GameConfig {
        GameConfig {
            scoring: self.scoring,
        }
    }

    /// Seed to start with; blank seeds count as absent.
    pub fn seed(&self) -> Option<&str> {
        self.seed.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn clear_delay(&self) -> Duration {
        Duration::from_millis(self.clear_ms)
    }
}

/// Route `log` output to `path`, filtered by `RUST_LOG` (default `info`).
///
/// Returns false when no path is given and logging stays disabled.
pub fn init_logging(path: Option<&Path>) -> Result<bool> {
    let Some(path) = path else {
        return Ok(false);
    };
    let file = File::create(path)?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .try_init()?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        std::env::remove_var("SHAPE_SORTER_SEED");
        std::env::remove_var("SHAPE_SORTER_SCORING");
        std::env::remove_var("SHAPE_SORTER_LOG");
    }

    #[test]
    #[serial]
    fn defaults() {
        clear_env();
        let cli = Cli::try_parse_from(["shape-sorter"]).unwrap();
        assert_eq!(cli.seed(), None);
        assert_eq!(cli.game_config().scoring, LineScoring::PerLine);
        assert_eq!(cli.settle_delay(), Duration::from_millis(400));
        assert_eq!(cli.clear_delay(), Duration::from_millis(800));
        assert!(cli.log_file.is_none());
    }

    #[test]
    #[serial]
    fn flags_override_defaults() {
        clear_env();
        let cli = Cli::try_parse_from([
            "shape-sorter",
            "--seed",
            "abc",
            "--scoring",
            "per-cell",
            "--clear-ms",
            "0",
        ])
        .unwrap();
        assert_eq!(cli.seed(), Some("abc"));
        assert_eq!(cli.scoring, LineScoring::PerCell);
        assert_eq!(cli.clear_delay(), Duration::ZERO);
    }

    #[test]
    #[serial]
    fn environment_supplies_seed_and_scoring() {
        clear_env();
        std::env::set_var("SHAPE_SORTER_SEED", "from-env");
        std::env::set_var("SHAPE_SORTER_SCORING", "per-cell");

        let cli = Cli::try_parse_from(["shape-sorter"]).unwrap();
        clear_env();

        assert_eq!(cli.seed(), Some("from-env"));
        assert_eq!(cli.scoring, LineScoring::PerCell);
    }

    #[test]
    #[serial]
    fn blank_seed_is_absent() {
        clear_env();
        let cli = Cli::try_parse_from(["shape-sorter", "--seed", "  "]).unwrap();
        assert_eq!(cli.seed(), None);
    }

    #[test]
    #[serial]
    fn unknown_scoring_is_rejected() {
        clear_env();
        assert!(Cli::try_parse_from(["shape-sorter", "--scoring", "double"]).is_err());
    }

    #[test]
    fn logging_without_path_is_disabled() {
        assert!(!init_logging(None).unwrap());
    }
}
