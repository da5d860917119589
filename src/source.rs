use crate::error::EngineError;
use crate::models::{Dataset, Episode, Rating, Title};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const TITLES_TABLE: &str = "title.basics";
pub const RATINGS_TABLE: &str = "title.ratings";
pub const EPISODES_TABLE: &str = "title.episode";
pub const TABLES: [&str; 3] = [TITLES_TABLE, RATINGS_TABLE, EPISODES_TABLE];

const NULL: &str = "\\N";

#[async_trait]
pub trait TableSource: Send + Sync {
    async fn titles(&self) -> Result<Vec<Title>>;
    async fn ratings(&self) -> Result<Vec<Rating>>;
    async fn episodes(&self) -> Result<Vec<Episode>>;

    async fn load(&self) -> Result<Dataset> {
        let (titles, ratings, episodes) =
            tokio::try_join!(self.titles(), self.ratings(), self.episodes())?;
        info!(
            "Loaded {} titles, {} ratings, {} episodes",
            titles.len(),
            ratings.len(),
            episodes.len()
        );
        Ok(Dataset {
            titles,
            ratings,
            episodes,
        })
    }
}

#[derive(Debug, Clone)]
pub struct TsvTableSource {
    dir: PathBuf,
}

impl TsvTableSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn table_path(&self, table: &str) -> PathBuf {
        table_path(&self.dir, table)
    }

    pub fn missing_tables(&self) -> Vec<&'static str> {
        TABLES
            .into_iter()
            .filter(|t| !self.table_path(t).is_file())
            .collect()
    }

    async fn read<T, F>(&self, table: &'static str, parse: F) -> Result<Vec<T>>
    where
        T: Send + 'static,
        F: FnOnce(BufReader<File>) -> Result<TableRead<T>> + Send + 'static,
    {
        let path = self.table_path(table);
        let read = tokio::task::spawn_blocking(move || -> Result<TableRead<T>> {
            let file = match File::open(&path) {
                Ok(f) => f,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    return Err(EngineError::MissingTable(table.to_string()).into());
                }
                Err(e) => {
                    return Err(e).with_context(|| format!("Failed to open {}", path.display()));
                }
            };
            parse(BufReader::new(file))
                .with_context(|| format!("Failed to read {}", path.display()))
        })
        .await
        .map_err(|e| anyhow!("Reader for {} panicked: {}", table, e))??;

        if read.skipped > 0 {
            warn!("Skipped {} malformed rows in {}", read.skipped, table);
        }
        Ok(read.rows)
    }
}

#[async_trait]
impl TableSource for TsvTableSource {
    async fn titles(&self) -> Result<Vec<Title>> {
        self.read(TITLES_TABLE, parse_titles).await
    }

    async fn ratings(&self) -> Result<Vec<Rating>> {
        self.read(RATINGS_TABLE, parse_ratings).await
    }

    async fn episodes(&self) -> Result<Vec<Episode>> {
        self.read(EPISODES_TABLE, parse_episodes).await
    }
}

pub fn table_path(dir: &Path, table: &str) -> PathBuf {
    dir.join(format!("{table}.tsv"))
}

#[derive(Debug)]
pub struct TableRead<T> {
    pub rows: Vec<T>,
    pub skipped: usize,
}

struct Header {
    columns: HashMap<String, usize>,
}

impl Header {
    fn parse(line: &str) -> Self {
        let columns = line
            .trim_end_matches(['\r', '\n'])
            .split('\t')
            .enumerate()
            .map(|(i, name)| (name.to_string(), i))
            .collect();
        Self { columns }
    }

    fn index(&self, name: &str) -> Result<usize> {
        self.columns
            .get(name)
            .copied()
            .ok_or_else(|| anyhow!("Missing column '{}'", name))
    }
}

fn value<'a>(fields: &[&'a str], idx: usize) -> Option<&'a str> {
    fields.get(idx).copied().filter(|v| *v != NULL)
}

fn read_rows<R, T, F>(reader: R, required: &[&str], mut parse_row: F) -> Result<TableRead<T>>
where
    R: BufRead,
    F: FnMut(&[usize], &[&str]) -> Option<T>,
{
    let mut lines = reader.lines();
    let header = match lines.next() {
        Some(line) => Header::parse(&line?),
        None => return Ok(TableRead { rows: Vec::new(), skipped: 0 }),
    };
    let idx = required
        .iter()
        .map(|name| header.index(name))
        .collect::<Result<Vec<_>>>()?;

    let mut rows = Vec::new();
    let mut skipped = 0usize;
    for line in lines {
        let line = line?;
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        match parse_row(&idx, &fields) {
            Some(row) => rows.push(row),
            None => skipped += 1,
        }
    }
    Ok(TableRead { rows, skipped })
}

pub fn parse_titles<R: BufRead>(reader: R) -> Result<TableRead<Title>> {
    read_rows(
        reader,
        &["tconst", "titleType", "primaryTitle", "genres"],
        |idx, fields| {
            Some(Title {
                id: value(fields, idx[0])?.to_string(),
                title_type: value(fields, idx[1])?.to_string(),
                name: value(fields, idx[2]).unwrap_or_default().to_string(),
                genres: value(fields, idx[3])
                    .map(|g| {
                        g.split(',')
                            .map(str::trim)
                            .filter(|s| !s.is_empty())
                            .map(str::to_string)
                            .collect()
                    })
                    .unwrap_or_default(),
            })
        },
    )
}

pub fn parse_ratings<R: BufRead>(reader: R) -> Result<TableRead<Rating>> {
    read_rows(
        reader,
        &["tconst", "averageRating", "numVotes"],
        |idx, fields| {
            let score: f64 = value(fields, idx[1])?.parse().ok()?;
            let votes: f64 = value(fields, idx[2])?.parse().ok()?;
            if !score.is_finite() || !votes.is_finite() || votes < 0.0 {
                return None;
            }
            Some(Rating {
                id: value(fields, idx[0])?.to_string(),
                score,
                votes,
            })
        },
    )
}

pub fn parse_episodes<R: BufRead>(reader: R) -> Result<TableRead<Episode>> {
    read_rows(
        reader,
        &["tconst", "parentTconst", "seasonNumber", "episodeNumber"],
        |idx, fields| {
            Some(Episode {
                id: value(fields, idx[0])?.to_string(),
                parent_id: value(fields, idx[1])?.to_string(),
                season: value(fields, idx[2]).and_then(|s| s.parse().ok()),
                episode: value(fields, idx[3]).and_then(|s| s.parse().ok()),
            })
        },
    )
}
