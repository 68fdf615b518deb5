use clap::Parser;
use stockflux::cli::{Cli, Commands};
use stockflux::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Credentials may live in a .env next to the binary.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;

    let _telemetry = stockflux::telemetry::init_telemetry(&config.telemetry)?;

    match cli.command {
        Commands::Run(args) => {
            tracing::info!("Starting ingest + chart run");
            args.execute(&config).await?;
        }
        Commands::Ingest(args) => {
            tracing::info!("Starting ingestion");
            args.execute(&config).await?;
        }
        Commands::Chart(args) => {
            tracing::info!("Rendering chart from stored data");
            args.execute(&config).await?;
        }
        Commands::Config => {
            println!("Current configuration:");
            println!("  Store: {} (org: {}, bucket: {})", config.store.url, config.store.org, config.store.bucket);
            println!("  Store token set: {}", !config.store.token.is_empty());
            println!("  News enabled: {}", config.news.api_key.is_some());
            println!("  Symbols: {}", config.ingest.symbols.join(", "));
            println!("  Lookback: {} days", config.ingest.lookback_days);
            println!("  Chart output: {}", config.chart.output_path.display());
        }
    }

    Ok(())
}
