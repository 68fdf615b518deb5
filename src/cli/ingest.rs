//! Ingest command implementation

use crate::config::Config;
use crate::pipeline::Pipeline;
use chrono::NaiveDate;
use clap::Args;

#[derive(Args, Debug)]
pub struct IngestArgs {
    /// Ticker symbols (comma separated); defaults to the configured list
    #[arg(short, long, value_delimiter = ',')]
    pub symbols: Vec<String>,

    /// Range start (YYYY-MM-DD); defaults to the configured lookback
    #[arg(long)]
    pub start: Option<NaiveDate>,

    /// Range end (YYYY-MM-DD); defaults to today
    #[arg(long)]
    pub end: Option<NaiveDate>,
}

impl IngestArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let (symbols, start, end) =
            super::resolve_batch(config, &self.symbols, self.start, self.end);

        let pipeline = Pipeline::from_config(config)?;
        let reports = pipeline.ingest_all(&symbols, start, end).await?;

        let mut failed = 0;
        for report in &reports {
            println!(
                "{:<8} price={} news={}",
                report.symbol, report.price, report.news
            );
            if report.has_failure() {
                failed += 1;
            }
        }
        if failed > 0 {
            anyhow::bail!("{failed} of {} symbols failed to ingest", reports.len());
        }
        Ok(())
    }
}
