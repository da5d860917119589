use anyhow::Result;
use dotenvy::dotenv;
use std::env;
use std::io;
use std::sync::Arc;
use titlerank::cli::{confirm, Args};
use titlerank::config::Settings;
use titlerank::dataset;
use titlerank::sink::{CsvDirSink, TableSink};
use titlerank::source::TsvTableSource;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

fn ask(prompt: &str, args: &Args) -> Result<bool> {
    if args.assume_yes {
        return Ok(true);
    }
    confirm(prompt, &mut io::stdin().lock(), &mut io::stdout())
}

#[tokio::main]
async fn main() -> Result<()> {
    let dotenv_result = dotenv();
    init_tracing();
    match dotenv_result {
        Ok(path) => info!("Loaded environment from {:?}", path),
        Err(e) => warn!("No .env file loaded ({}) - relying on environment", e),
    }

    let args = Args::parse(env::args().skip(1))?;
    let settings = Settings::from_env()?;
    let source = TsvTableSource::new(&settings.data_dir);

    let missing = source.missing_tables();
    let refresh = if args.update {
        ask("Download the latest dataset now?", &args)?
    } else if !missing.is_empty() {
        warn!("Missing tables in {}: {:?}", settings.data_dir.display(), missing);
        ask("Some tables are missing. Download them now?", &args)?
    } else {
        false
    };
    if refresh {
        dataset::refresh(&settings).await?;
    }

    let sink: Arc<dyn TableSink> = Arc::new(CsvDirSink::new(&settings.output_dir));
    let outcome = titlerank::app::run(&settings, &source, sink).await?;
    if !outcome.report.is_clean() {
        warn!(
            "{} partitions failed; the menu lists only the exported ones",
            outcome.report.failed.len()
        );
    }
    Ok(())
}
