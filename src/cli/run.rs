//! Run command implementation

use crate::config::Config;
use crate::pipeline::Pipeline;
use chrono::NaiveDate;
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Ticker symbols (comma separated); defaults to the configured list
    #[arg(short, long, value_delimiter = ',')]
    pub symbols: Vec<String>,

    /// Range start (YYYY-MM-DD); defaults to the configured lookback
    #[arg(long)]
    pub start: Option<NaiveDate>,

    /// Range end (YYYY-MM-DD); defaults to today
    #[arg(long)]
    pub end: Option<NaiveDate>,

    /// Chart output path; defaults to the configured path
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl RunArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let (symbols, start, end) =
            super::resolve_batch(config, &self.symbols, self.start, self.end);
        let output = self
            .output
            .clone()
            .unwrap_or_else(|| config.chart.output_path.clone());

        let pipeline = Pipeline::from_config(config)?;
        let summary = pipeline.run(&symbols, start, end, &output).await?;

        for report in &summary.reports {
            println!(
                "{:<8} price={} news={}",
                report.symbol, report.price, report.news
            );
        }
        println!(
            "points written: {}, chart: {}",
            summary.points_written(),
            if summary.chart_written {
                output.display().to_string()
            } else {
                "not written".to_string()
            }
        );

        if summary.has_failures() {
            anyhow::bail!("one or more symbols failed to ingest");
        }
        Ok(())
    }
}
