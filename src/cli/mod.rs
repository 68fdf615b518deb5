//! CLI interface for stockflux
//!
//! Provides subcommands for:
//! - `run`: ingest then chart in one pass
//! - `ingest`: ingestion only
//! - `chart`: retrieval and chart rendering only
//! - `config`: show effective configuration

mod chart;
mod ingest;
mod run;

pub use chart::ChartArgs;
pub use ingest::IngestArgs;
pub use run::RunArgs;

use crate::config::Config;
use chrono::{Duration, NaiveDate, Utc};
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "stockflux")]
#[command(about = "Incremental OHLCV and news ingestion into a time-series store")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ingest and render the chart in one pass
    Run(RunArgs),
    /// Ingest prices and news only
    Ingest(IngestArgs),
    /// Retrieve and render the chart only
    Chart(ChartArgs),
    /// Show effective configuration
    Config,
}

/// Shared resolution of symbols and date range: CLI arguments win,
/// otherwise the configured symbol list and lookback window apply.
pub(crate) fn resolve_batch(
    config: &Config,
    symbols: &[String],
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> (Vec<String>, NaiveDate, NaiveDate) {
    let symbols = if symbols.is_empty() {
        config.ingest.symbols.clone()
    } else {
        symbols.to_vec()
    };
    let end = end.unwrap_or_else(|| Utc::now().date_naive());
    let start = start.unwrap_or(end - Duration::days(config.ingest.lookback_days as i64));
    (symbols, start, end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_batch_defaults_from_config() {
        let config = Config::default();
        let (symbols, start, end) = resolve_batch(&config, &[], None, None);
        assert_eq!(symbols, config.ingest.symbols);
        assert_eq!(end - start, Duration::days(60));
    }

    #[test]
    fn test_resolve_batch_prefers_arguments() {
        let config = Config::default();
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        let (symbols, s, e) = resolve_batch(
            &config,
            &["NVDA".to_string()],
            Some(start),
            Some(end),
        );
        assert_eq!(symbols, vec!["NVDA"]);
        assert_eq!((s, e), (start, end));
    }

    #[test]
    fn test_cli_parses_run_command() {
        let cli = Cli::try_parse_from([
            "stockflux",
            "run",
            "--symbols",
            "AAPL,MSFT",
            "--start",
            "2024-01-01",
            "--end",
            "2024-01-31",
        ])
        .unwrap();
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.symbols, vec!["AAPL", "MSFT"]);
                assert_eq!(
                    args.start,
                    Some(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
                );
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_cli_rejects_malformed_date() {
        let result = Cli::try_parse_from(["stockflux", "run", "--start", "01/02/2024"]);
        assert!(result.is_err());
    }
}
