use crate::base::BaseTable;
use crate::config::Settings;
use crate::menu::MenuIndex;
use crate::sink::TableSink;
use crate::source::TableSource;
use crate::walker::{self, RunReport, WalkOptions};
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

pub const MENU_DOCUMENT: &str = "titleMenus";
pub const LAST_UPDATED_DOCUMENT: &str = "lastUpdated";

#[derive(Debug)]
pub struct RunOutcome {
    pub menu: MenuIndex,
    pub report: RunReport,
}

pub async fn run(
    settings: &Settings,
    source: &dyn TableSource,
    sink: Arc<dyn TableSink>,
) -> Result<RunOutcome> {
    run_at(settings, source, sink, Utc::now()).await
}

pub async fn run_at(
    settings: &Settings,
    source: &dyn TableSource,
    sink: Arc<dyn TableSink>,
    now: DateTime<Utc>,
) -> Result<RunOutcome> {
    let started = Instant::now();
    let dataset = source.load().await.context("Failed to load source tables")?;

    let excluded_genre = settings.excluded_genre.clone();
    let base = tokio::task::spawn_blocking(move || {
        BaseTable::new(
            &dataset.titles,
            &dataset.ratings,
            &dataset.episodes,
            &excluded_genre,
        )
    })
    .await
    .map_err(|e| anyhow!("Building the base table panicked: {}", e))?;
    info!(
        "Base table ready: {} rated titles, {} episodes",
        base.rows.len(),
        base.episodes.len()
    );

    let options = WalkOptions {
        export_limit: settings.export_limit,
        spread: settings.spread,
        workers: settings.workers,
    };
    let (menu, report) = walker::walk(Arc::new(base), sink.clone(), options).await;

    sink.write_document(MENU_DOCUMENT, &serde_json::to_value(&menu)?)
        .await
        .context("Failed to write menu index")?;
    sink.write_document(
        LAST_UPDATED_DOCUMENT,
        &json!(now.format("%Y-%m-%d").to_string()),
    )
    .await
    .context("Failed to write last update date")?;

    info!(
        "Run finished in {:.1?}: {} partitions exported, {} empty, {} failed",
        started.elapsed(),
        report.succeeded.len(),
        report.skipped.len(),
        report.failed.len()
    );
    for failure in &report.failed {
        warn!("Partition {} was not exported: {}", failure.partition, failure.error);
    }
    Ok(RunOutcome { menu, report })
}
