use crate::models::{BaseRow, EpisodeRow, Ranked, RowKey, Scored, SeasonRow};
use serde::Serialize;
use std::collections::HashSet;

/// Full-width comma, stands in for `,` so cells never need quoting.
pub const WIDE_COMMA: &str = "\u{FF0C}";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn to_csv(&self) -> String {
        let mut out = self.columns.join(",");
        out.push('\n');
        for row in &self.rows {
            out.push_str(&row.join(","));
            out.push('\n');
        }
        out
    }
}

pub trait Exportable: Scored {
    fn columns() -> &'static [&'static str];
    fn cells(&self) -> Vec<String>;
}

impl Exportable for BaseRow {
    fn columns() -> &'static [&'static str] {
        &["tconst", "primaryTitle", "averageRating", "numVotes", "ranking"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            sanitize(&self.id),
            sanitize(&self.name),
            format_score(self.score),
            format_votes(self.votes),
        ]
    }
}

impl Exportable for EpisodeRow {
    fn columns() -> &'static [&'static str] {
        &[
            "tconst",
            "primaryTitle",
            "seriesTitle",
            "seasonNumber",
            "episodeNumber",
            "averageRating",
            "numVotes",
            "ranking",
        ]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            sanitize(&self.base.id),
            sanitize(&self.base.name),
            sanitize(&self.series_name),
            self.season.map(|s| s.to_string()).unwrap_or_default(),
            self.episode.map(|e| e.to_string()).unwrap_or_default(),
            format_score(self.base.score),
            format_votes(self.base.votes),
        ]
    }
}

impl Exportable for SeasonRow {
    fn columns() -> &'static [&'static str] {
        &[
            "tconst",
            "primaryTitle",
            "seasonNumber",
            "averageRating",
            "numVotes",
            "ranking",
        ]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            sanitize(&self.series_id),
            sanitize(&self.series_name),
            self.season.to_string(),
            format_score(self.score),
            format_votes(self.votes),
        ]
    }
}

pub fn sanitize(value: &str) -> String {
    value.replace(',', WIDE_COMMA)
}

pub fn format_score(score: f64) -> String {
    format!("{:.1}", (score * 10.0).round() / 10.0)
}

pub fn format_votes(votes: f64) -> String {
    format!("{}", votes.round().max(0.0) as u64)
}

// Short partitions overlap and come back whole.
pub fn select<T: Scored>(ranked: Vec<Ranked<T>>, limit: usize) -> Vec<Ranked<T>> {
    let len = ranked.len();
    let tail_start = len.saturating_sub(limit);

    let mut seen: HashSet<RowKey> = HashSet::with_capacity(limit.saturating_mul(2).min(len));
    let mut picked: Vec<Ranked<T>> = ranked
        .into_iter()
        .enumerate()
        .filter(|(i, _)| *i < limit || *i >= tail_start)
        .map(|(_, r)| r)
        .filter(|r| seen.insert(r.row.key()))
        .collect();
    picked.sort_by_key(|r| r.rank);
    picked
}

pub fn render<T: Exportable>(rows: &[Ranked<T>]) -> Table {
    Table {
        columns: T::columns().iter().map(|c| c.to_string()).collect(),
        rows: rows
            .iter()
            .map(|r| {
                let mut cells = r.row.cells();
                cells.push(r.rank.to_string());
                cells
            })
            .collect(),
    }
}

pub fn export<T: Exportable>(ranked: Vec<Ranked<T>>, limit: usize) -> Table {
    render(&select(ranked, limit))
}
