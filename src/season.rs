use crate::error::EngineError;
use crate::models::{EpisodeRow, Ranked, SeasonRow};
use crate::ranking;
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Default)]
struct SeasonTotals {
    series_name: String,
    weighted_sum: f64,
    votes: f64,
    episodes: usize,
    last_score: f64,
}

impl SeasonTotals {
    fn score(&self) -> f64 {
        // A lone episode keeps its score bit for bit.
        if self.episodes == 1 {
            self.last_score
        } else {
            self.weighted_sum / self.votes
        }
    }
}

pub fn aggregate(episodes: &[EpisodeRow]) -> Vec<SeasonRow> {
    let mut groups: BTreeMap<(&str, u32), SeasonTotals> = BTreeMap::new();
    for ep in episodes {
        let Some(season) = ep.season else {
            continue;
        };
        let totals = groups
            .entry((ep.series_id.as_str(), season))
            .or_insert_with(|| SeasonTotals {
                series_name: ep.series_name.clone(),
                ..Default::default()
            });
        totals.weighted_sum += ep.base.score * ep.base.votes;
        totals.votes += ep.base.votes;
        totals.episodes += 1;
        totals.last_score = ep.base.score;
    }

    let mut unvoted = 0usize;
    let seasons: Vec<SeasonRow> = groups
        .into_iter()
        .filter_map(|((series_id, season), totals)| {
            if totals.votes <= 0.0 {
                unvoted += 1;
                return None;
            }
            Some(SeasonRow {
                series_id: series_id.to_string(),
                score: totals.score(),
                series_name: totals.series_name,
                season,
                votes: totals.votes,
            })
        })
        .collect();
    if unvoted > 0 {
        debug!("Skipped {} seasons without votes", unvoted);
    }
    seasons
}

// Aggregates then ranks. Nothing to aggregate yields an empty ranking.
pub fn rank_seasons(
    episodes: &[EpisodeRow],
    spread: f64,
) -> Result<Vec<Ranked<SeasonRow>>, EngineError> {
    let seasons = aggregate(episodes);
    if seasons.is_empty() {
        return Ok(Vec::new());
    }
    ranking::rank(seasons, spread)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BaseRow, Category};

    fn episode(id: &str, series: &str, season: Option<u32>, score: f64, votes: f64) -> EpisodeRow {
        EpisodeRow {
            base: BaseRow {
                id: id.to_string(),
                name: format!("Episode {id}"),
                genres: vec!["Drama".to_string()],
                category: Category::Episode,
                score,
                votes,
            },
            series_id: series.to_string(),
            series_name: format!("Series {series}"),
            season,
            episode: Some(1),
        }
    }

    #[test]
    fn single_episode_season_keeps_score() {
        let seasons = aggregate(&[episode("tt1", "tt100", Some(2), 7.3, 37.0)]);
        assert_eq!(seasons.len(), 1);
        assert_eq!(seasons[0].score, 7.3);
        assert_eq!(seasons[0].votes, 37.0);
        assert_eq!(seasons[0].season, 2);
        assert_eq!(seasons[0].series_name, "Series tt100");
    }

    #[test]
    fn weights_scores_by_votes() {
        let seasons = aggregate(&[
            episode("tt1", "tt100", Some(1), 8.0, 10.0),
            episode("tt2", "tt100", Some(1), 4.0, 5.0),
        ]);
        assert_eq!(seasons.len(), 1);
        assert!((seasons[0].score - 20.0 / 3.0).abs() < 1e-9);
        assert_eq!(seasons[0].votes, 15.0);
    }

    #[test]
    fn groups_by_series_and_season() {
        let seasons = aggregate(&[
            episode("tt1", "tt200", Some(1), 6.0, 1.0),
            episode("tt2", "tt100", Some(2), 7.0, 1.0),
            episode("tt3", "tt100", Some(1), 8.0, 1.0),
            episode("tt4", "tt100", None, 9.0, 1.0),
        ]);
        let keys: Vec<(&str, u32)> = seasons
            .iter()
            .map(|s| (s.series_id.as_str(), s.season))
            .collect();
        assert_eq!(keys, vec![("tt100", 1), ("tt100", 2), ("tt200", 1)]);
    }

    #[test]
    fn zero_vote_seasons_are_excluded() {
        let seasons = aggregate(&[
            episode("tt1", "tt100", Some(1), 8.0, 0.0),
            episode("tt2", "tt100", Some(1), 6.0, 0.0),
            episode("tt3", "tt100", Some(2), 6.0, 3.0),
        ]);
        assert_eq!(seasons.len(), 1);
        assert_eq!(seasons[0].season, 2);
        assert!(seasons.iter().all(|s| s.score.is_finite()));
    }

    #[test]
    fn ranking_nothing_is_empty_not_an_error() {
        let ranked = rank_seasons(&[episode("tt1", "tt100", None, 8.0, 5.0)], 1.0).unwrap();
        assert!(ranked.is_empty());
    }
}
