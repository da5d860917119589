use crate::base::BaseTable;
use crate::error::EngineError;
use crate::export::{self, Table};
use crate::menu::{MenuIndex, MenuIndexBuilder};
use crate::models::{BaseRow, Category, EpisodeRow, Partition, Section};
use crate::ranking;
use crate::season;
use crate::sink::TableSink;
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy)]
pub struct WalkOptions {
    pub export_limit: usize,
    pub spread: f64,
    pub workers: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    Titles(Category),
    Episodes,
    Seasons,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionJob {
    pub partition: Partition,
    pub kind: JobKind,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PartitionSummary {
    pub partition: Partition,
    pub ranked_rows: usize,
    pub emitted_rows: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PartitionFailure {
    pub partition: Partition,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    pub succeeded: Vec<PartitionSummary>,
    pub skipped: Vec<Partition>,
    pub failed: Vec<PartitionFailure>,
}

impl RunReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    fn sort(&mut self) {
        self.succeeded.sort_by(|a, b| a.partition.cmp(&b.partition));
        self.skipped.sort();
        self.failed.sort_by(|a, b| a.partition.cmp(&b.partition));
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PartitionOutput {
    pub table: Table,
    pub ranked_rows: usize,
}

enum Outcome {
    Emitted { ranked_rows: usize, emitted_rows: usize },
    Empty,
    Failed(String),
}

struct Completed {
    partition: Partition,
    outcome: Outcome,
}

pub fn plan(base: &BaseTable) -> Vec<PartitionJob> {
    let mut jobs = Vec::new();
    for category in Category::ALL {
        if !base.has_category(category) {
            continue;
        }
        let genres: Vec<Option<String>> = std::iter::once(None)
            .chain(base.genres(category).into_iter().map(Some))
            .collect();
        for genre in genres {
            if category == Category::Episode {
                jobs.push(PartitionJob {
                    partition: Partition::new(Section::Episode, genre.clone()),
                    kind: JobKind::Episodes,
                });
                jobs.push(PartitionJob {
                    partition: Partition::new(Section::Season, genre),
                    kind: JobKind::Seasons,
                });
            } else {
                jobs.push(PartitionJob {
                    partition: Partition::new(category.section(), genre),
                    kind: JobKind::Titles(category),
                });
            }
        }
    }
    jobs
}

pub fn run_partition(
    base: &BaseTable,
    job: &PartitionJob,
    export_limit: usize,
    spread: f64,
) -> Result<Option<PartitionOutput>, EngineError> {
    let partition = &job.partition;
    match job.kind {
        JobKind::Titles(category) => {
            let rows: Vec<BaseRow> = base
                .category_rows(category)
                .filter(|r| partition.matches(&r.genres))
                .cloned()
                .collect();
            if rows.is_empty() {
                return Ok(None);
            }
            let ranked = ranking::rank(rows, spread)?;
            Ok(Some(PartitionOutput {
                ranked_rows: ranked.len(),
                table: export::export(ranked, export_limit),
            }))
        }
        JobKind::Episodes => {
            let rows = episode_slice(base, partition);
            if rows.is_empty() {
                return Ok(None);
            }
            let ranked = ranking::rank(rows, spread)?;
            Ok(Some(PartitionOutput {
                ranked_rows: ranked.len(),
                table: export::export(ranked, export_limit),
            }))
        }
        JobKind::Seasons => {
            let rows = episode_slice(base, partition);
            let ranked = season::rank_seasons(&rows, spread)?;
            if ranked.is_empty() {
                return Ok(None);
            }
            Ok(Some(PartitionOutput {
                ranked_rows: ranked.len(),
                table: export::export(ranked, export_limit),
            }))
        }
    }
}

fn episode_slice(base: &BaseTable, partition: &Partition) -> Vec<EpisodeRow> {
    base.episodes
        .iter()
        .filter(|e| partition.matches(&e.base.genres))
        .cloned()
        .collect()
}

async fn process(
    base: Arc<BaseTable>,
    sink: Arc<dyn TableSink>,
    job: PartitionJob,
    options: WalkOptions,
) -> Outcome {
    let label = job.partition.to_string();
    let computed = tokio::task::spawn_blocking(move || {
        run_partition(&base, &job, options.export_limit, options.spread).map(|out| (job, out))
    })
    .await;

    let (job, output) = match computed {
        Ok(Ok(done)) => done,
        Ok(Err(e)) => return Outcome::Failed(e.to_string()),
        Err(e) => return Outcome::Failed(format!("ranking task for {} panicked: {}", label, e)),
    };
    let Some(output) = output else {
        return Outcome::Empty;
    };

    let name = job.partition.file_stem();
    match sink.write_table(&name, &output.table).await {
        Ok(()) => {
            debug!(
                "Exported {} ({} of {} rows)",
                name,
                output.table.len(),
                output.ranked_rows
            );
            Outcome::Emitted {
                ranked_rows: output.ranked_rows,
                emitted_rows: output.table.len(),
            }
        }
        Err(e) => Outcome::Failed(format!("{:#}", e)),
    }
}

pub async fn walk(
    base: Arc<BaseTable>,
    sink: Arc<dyn TableSink>,
    options: WalkOptions,
) -> (MenuIndex, RunReport) {
    let jobs = plan(&base);
    info!(
        "Ranking {} partitions on {} workers",
        jobs.len(),
        options.workers
    );

    let (tx, mut rx) = mpsc::channel::<Completed>(options.workers.max(1) * 4);
    let slice_size = options.export_limit;
    let accumulator = tokio::spawn(async move {
        let mut menu = MenuIndexBuilder::new();
        let mut report = RunReport::default();
        while let Some(Completed { partition, outcome }) = rx.recv().await {
            match outcome {
                Outcome::Emitted {
                    ranked_rows,
                    emitted_rows,
                } => {
                    menu.record(&partition, emitted_rows, slice_size);
                    report.succeeded.push(PartitionSummary {
                        partition,
                        ranked_rows,
                        emitted_rows,
                    });
                }
                Outcome::Empty => {
                    debug!("Partition {} is empty, skipping", partition);
                    report.skipped.push(partition);
                }
                Outcome::Failed(error) => {
                    error!("Partition {} failed: {}", partition, error);
                    report.failed.push(PartitionFailure { partition, error });
                }
            }
        }
        report.sort();
        (menu.finish(), report)
    });

    let sem = Arc::new(Semaphore::new(options.workers.max(1)));
    let mut joinset = JoinSet::new();
    for job in jobs {
        let base = base.clone();
        let sink = sink.clone();
        let sem = sem.clone();
        let tx = tx.clone();
        joinset.spawn(async move {
            let Ok(_permit) = sem.acquire_owned().await else {
                return;
            };
            let partition = job.partition.clone();
            let outcome = process(base, sink, job, options).await;
            if tx.send(Completed { partition, outcome }).await.is_err() {
                warn!("Accumulator stopped before all partitions reported");
            }
        });
    }
    drop(tx);

    while let Some(res) = joinset.join_next().await {
        if let Err(e) = res {
            error!("Partition task panicked: {}", e);
        }
    }

    match accumulator.await {
        Ok(done) => done,
        Err(e) => {
            error!("Menu accumulator panicked: {}", e);
            (MenuIndex::default(), RunReport::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Episode, Rating, Title};

    fn title(id: &str, title_type: &str, genres: &[&str]) -> Title {
        Title {
            id: id.to_string(),
            title_type: title_type.to_string(),
            name: format!("Name {id}"),
            genres: genres.iter().map(|g| g.to_string()).collect(),
        }
    }

    fn rating(id: &str, score: f64, votes: f64) -> Rating {
        Rating {
            id: id.to_string(),
            score,
            votes,
        }
    }

    fn sample() -> BaseTable {
        let titles = vec![
            title("tt1", "movie", &["Drama", "Comedy"]),
            title("tt2", "movie", &["Drama"]),
            title("tt3", "tvSeries", &["Crime"]),
            title("tt4", "tvEpisode", &["Crime"]),
            title("tt5", "tvEpisode", &[]),
        ];
        let ratings = vec![
            rating("tt1", 8.0, 100.0),
            rating("tt2", 6.0, 50.0),
            rating("tt3", 7.0, 10.0),
            rating("tt4", 9.0, 20.0),
            rating("tt5", 5.0, 0.0),
        ];
        let episodes = vec![
            Episode {
                id: "tt4".to_string(),
                parent_id: "tt3".to_string(),
                season: Some(1),
                episode: Some(1),
            },
            Episode {
                id: "tt5".to_string(),
                parent_id: "tt3".to_string(),
                season: Some(2),
                episode: Some(1),
            },
        ];
        BaseTable::new(&titles, &ratings, &episodes, "Adult")
    }

    #[test]
    fn plans_all_genre_views_and_seasons() {
        let stems: Vec<String> = plan(&sample())
            .iter()
            .map(|j| j.partition.file_stem())
            .collect();
        assert_eq!(
            stems,
            vec![
                "title_movie",
                "title_movie_Comedy",
                "title_movie_Drama",
                "title_series",
                "title_series_Crime",
                "title_episode",
                "title_season",
                "title_episode_Crime",
                "title_season_Crime",
            ]
        );
    }

    #[test]
    fn genre_partitions_rank_independently() {
        let base = sample();
        let job = PartitionJob {
            partition: Partition::new(Section::Movie, Some("Comedy".to_string())),
            kind: JobKind::Titles(Category::Movie),
        };
        let out = run_partition(&base, &job, 10, 1.0).unwrap().unwrap();
        assert_eq!(out.ranked_rows, 1);
        assert_eq!(out.table.rows[0][0], "tt1");
        // Alone in its partition, the title keeps its raw score and rank 1.
        assert_eq!(out.table.rows[0][2], "8.0");
        assert_eq!(out.table.rows[0][4], "1");
    }

    #[test]
    fn zero_vote_seasons_leave_partition_smaller() {
        let base = sample();
        let job = PartitionJob {
            partition: Partition::new(Section::Season, None),
            kind: JobKind::Seasons,
        };
        let out = run_partition(&base, &job, 10, 1.0).unwrap().unwrap();
        assert_eq!(out.ranked_rows, 1);
        assert_eq!(out.table.rows[0], vec!["tt3", "Name tt3", "1", "9.0", "20", "1"]);
    }

    #[test]
    fn missing_genre_yields_no_output() {
        let base = sample();
        let job = PartitionJob {
            partition: Partition::new(Section::Movie, Some("Western".to_string())),
            kind: JobKind::Titles(Category::Movie),
        };
        assert_eq!(run_partition(&base, &job, 10, 1.0).unwrap(), None);
    }
}
