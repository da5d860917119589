use crate::export::Table;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::path::PathBuf;
use tokio::fs;
use tracing::debug;

#[async_trait]
pub trait TableSink: Send + Sync {
    async fn write_table(&self, name: &str, table: &Table) -> Result<()>;
    async fn write_document(&self, name: &str, document: &Value) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct CsvDirSink {
    dir: PathBuf,
}

impl CsvDirSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    async fn write_file(&self, file_name: String, contents: String) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;
        let path = self.dir.join(file_name);
        fs::write(&path, contents)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        debug!("Wrote {}", path.display());
        Ok(())
    }
}

#[async_trait]
impl TableSink for CsvDirSink {
    async fn write_table(&self, name: &str, table: &Table) -> Result<()> {
        self.write_file(format!("{name}.csv"), table.to_csv()).await
    }

    async fn write_document(&self, name: &str, document: &Value) -> Result<()> {
        let body = serde_json::to_string_pretty(document)?;
        self.write_file(format!("{name}.json"), body).await
    }
}
