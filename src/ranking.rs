use crate::error::EngineError;
use crate::models::{Ranked, Scored};
use std::cmp::Ordering;

pub const DEFAULT_SPREAD: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PartitionStats {
    pub mean_score: f64,
    pub mean_votes: f64,
    pub stddev_votes: f64,
    pub min_votes: f64,
}

impl PartitionStats {
    pub fn compute<T: Scored>(rows: &[T], spread: f64) -> Result<Self, EngineError> {
        if rows.is_empty() {
            return Err(EngineError::EmptyPartition);
        }
        if !spread.is_finite() || spread < 0.0 {
            return Err(EngineError::InvalidSpread(spread));
        }
        for row in rows {
            if !row.score().is_finite() {
                return Err(EngineError::NonFinite {
                    id: row.id().to_string(),
                    field: "score",
                });
            }
            if !row.votes().is_finite() || row.votes() < 0.0 {
                return Err(EngineError::NonFinite {
                    id: row.id().to_string(),
                    field: "votes",
                });
            }
        }

        let n = rows.len() as f64;
        let mean_score = rows.iter().map(|r| r.score()).sum::<f64>() / n;
        let mean_votes = rows.iter().map(|r| r.votes()).sum::<f64>() / n;
        // Population variance; a single row has none.
        let variance = rows
            .iter()
            .map(|r| (r.votes() - mean_votes).powi(2))
            .sum::<f64>()
            / n;
        let stddev_votes = variance.sqrt();

        Ok(Self {
            mean_score,
            mean_votes,
            stddev_votes,
            min_votes: mean_votes + spread * stddev_votes,
        })
    }

    pub fn weighted(&self, score: f64, votes: f64) -> f64 {
        weighted_rating(score, votes, self.mean_score, self.min_votes)
    }
}

pub fn weighted_rating(score: f64, votes: f64, mean_score: f64, min_votes: f64) -> f64 {
    let denominator = votes + min_votes;
    if denominator == 0.0 {
        return mean_score;
    }
    (score * votes + mean_score * min_votes) / denominator
}

/// Scores and dense-ranks `rows`, best first. Equal ranks keep input order.
pub fn rank<T: Scored>(rows: Vec<T>, spread: f64) -> Result<Vec<Ranked<T>>, EngineError> {
    let stats = PartitionStats::compute(&rows, spread)?;

    let mut scored: Vec<(f64, T)> = rows
        .into_iter()
        .map(|row| (stats.weighted(row.score(), row.votes()), row))
        .collect();
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));

    let mut ranked = Vec::with_capacity(scored.len());
    let mut rank = 0u32;
    let mut previous: Option<f64> = None;
    for (ranking, row) in scored {
        if previous != Some(ranking) {
            rank += 1;
            previous = Some(ranking);
        }
        ranked.push(Ranked { row, ranking, rank });
    }
    Ok(ranked)
}
