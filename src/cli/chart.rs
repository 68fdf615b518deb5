//! Chart command implementation

use crate::config::Config;
use crate::pipeline::Pipeline;
use chrono::NaiveDate;
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ChartArgs {
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

impl ChartArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let (symbols, start, end) =
            super::resolve_batch(config, &self.symbols, self.start, self.end);
        let output = self
            .output
            .clone()
            .unwrap_or_else(|| config.chart.output_path.clone());

        let pipeline = Pipeline::from_config(config)?;
        if pipeline.render_chart(&symbols, start, end, &output).await? {
            println!("chart written to {}", output.display());
        } else {
            println!("no chart written (nothing to visualize)");
        }
        Ok(())
    }
}
