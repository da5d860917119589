use crate::classify::classify_title;
use crate::models::{BaseRow, Category, Episode, EpisodeRow, Rating, Title};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct BaseTable {
    pub rows: Vec<BaseRow>,
    pub episodes: Vec<EpisodeRow>,
}

impl BaseTable {
    pub fn new(
        titles: &[Title],
        ratings: &[Rating],
        episodes: &[Episode],
        excluded_genre: &str,
    ) -> Self {
        let rows = build_base(titles, ratings, excluded_genre);
        let episodes = join_episodes(&rows, titles, episodes);
        Self { rows, episodes }
    }

    pub fn category_rows(&self, category: Category) -> impl Iterator<Item = &BaseRow> {
        self.rows.iter().filter(move |r| r.category == category)
    }

    pub fn genres(&self, category: Category) -> BTreeSet<String> {
        self.category_rows(category)
            .flat_map(|r| r.genres.iter())
            .filter(|g| !g.trim().is_empty())
            .cloned()
            .collect()
    }

    pub fn has_category(&self, category: Category) -> bool {
        self.rows.iter().any(|r| r.category == category)
    }
}

pub fn build_base(titles: &[Title], ratings: &[Rating], excluded_genre: &str) -> Vec<BaseRow> {
    let by_id: HashMap<&str, &Rating> = ratings.iter().map(|r| (r.id.as_str(), r)).collect();

    let mut unrated = 0usize;
    let mut rows: Vec<BaseRow> = titles
        .iter()
        .filter_map(|t| {
            let category = classify_title(t, excluded_genre)?;
            let Some(rating) = by_id.get(t.id.as_str()) else {
                unrated += 1;
                return None;
            };
            Some(BaseRow {
                id: t.id.clone(),
                name: t.name.clone(),
                genres: t.genres.clone(),
                category,
                score: rating.score,
                votes: rating.votes,
            })
        })
        .collect();
    rows.sort_by(|a, b| a.id.cmp(&b.id));

    debug!(
        "Built base table: {} rows from {} titles ({} classified but unrated)",
        rows.len(),
        titles.len(),
        unrated
    );
    rows
}

pub fn join_episodes(base: &[BaseRow], titles: &[Title], episodes: &[Episode]) -> Vec<EpisodeRow> {
    let records: HashMap<&str, &Episode> = episodes.iter().map(|e| (e.id.as_str(), e)).collect();
    let names: HashMap<&str, &str> = titles
        .iter()
        .map(|t| (t.id.as_str(), t.name.as_str()))
        .collect();

    base.iter()
        .filter(|r| r.category == Category::Episode)
        .filter_map(|r| {
            let record = records.get(r.id.as_str())?;
            Some(EpisodeRow {
                base: r.clone(),
                series_id: record.parent_id.clone(),
                series_name: names
                    .get(record.parent_id.as_str())
                    .map(|n| n.to_string())
                    .unwrap_or_default(),
                season: record.season,
                episode: record.episode,
            })
        })
        .collect()
}
