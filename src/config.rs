use crate::classify::DEFAULT_EXCLUDED_GENRE;
use crate::ranking::DEFAULT_SPREAD;
use anyhow::{bail, Context, Result};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_EXPORT_LIMIT: usize = 1000;
pub const DEFAULT_DATASET_URL: &str = "https://datasets.imdbws.com";
const MAX_WORKERS: usize = 64;

#[derive(Debug, Clone)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub output_dir: PathBuf,
    pub export_limit: usize,
    pub spread: f64,
    pub workers: usize,
    pub excluded_genre: String,
    pub dataset_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data/raw"),
            output_dir: PathBuf::from("data"),
            export_limit: DEFAULT_EXPORT_LIMIT,
            spread: DEFAULT_SPREAD,
            workers: default_workers(),
            excluded_genre: DEFAULT_EXCLUDED_GENRE.to_string(),
            dataset_url: DEFAULT_DATASET_URL.to_string(),
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let settings = Self {
            data_dir: env::var("TITLERANK_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            output_dir: env::var("TITLERANK_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            export_limit: parse_var("TITLERANK_EXPORT_LIMIT")?.unwrap_or(defaults.export_limit),
            spread: parse_var("TITLERANK_SPREAD")?.unwrap_or(defaults.spread),
            workers: parse_var::<usize>("TITLERANK_WORKERS")?
                .map(|n| n.clamp(1, MAX_WORKERS))
                .unwrap_or(defaults.workers),
            excluded_genre: env::var("TITLERANK_EXCLUDED_GENRE").unwrap_or(defaults.excluded_genre),
            dataset_url: env::var("TITLERANK_DATASET_URL").unwrap_or(defaults.dataset_url),
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.export_limit == 0 {
            bail!("Export limit must be at least 1");
        }
        if !self.spread.is_finite() || self.spread < 0.0 {
            bail!("Spread multiplier must be a non-negative number, got {}", self.spread);
        }
        if self.workers == 0 {
            bail!("Worker count must be at least 1");
        }
        if self.dataset_url.trim().is_empty() {
            bail!("Dataset URL cannot be empty");
        }
        Ok(())
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
        .clamp(1, MAX_WORKERS)
}

fn parse_var<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("Invalid value for {}: '{}'", key, raw)),
        _ => Ok(None),
    }
}
