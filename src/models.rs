use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Title {
    pub id: String,
    pub title_type: String,
    pub name: String,
    pub genres: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Rating {
    pub id: String,
    pub score: f64,
    pub votes: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Episode {
    pub id: String,
    pub parent_id: String,
    pub season: Option<u32>,
    pub episode: Option<u32>,
}

#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub titles: Vec<Title>,
    pub ratings: Vec<Rating>,
    pub episodes: Vec<Episode>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Movie,
    Series,
    Episode,
    VideoGame,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Movie,
        Category::Series,
        Category::Episode,
        Category::VideoGame,
    ];

    pub fn section(self) -> Section {
        match self {
            Category::Movie => Section::Movie,
            Category::Series => Section::Series,
            Category::Episode => Section::Episode,
            Category::VideoGame => Section::VideoGame,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Section {
    Movie,
    Series,
    Season,
    Episode,
    VideoGame,
}

impl Section {
    pub const DISPLAY_ORDER: [Section; 5] = [
        Section::Movie,
        Section::Series,
        Section::Season,
        Section::Episode,
        Section::VideoGame,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Section::Movie => "movie",
            Section::Series => "series",
            Section::Season => "season",
            Section::Episode => "episode",
            Section::VideoGame => "videoGame",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Partition {
    pub section: Section,
    pub genre: Option<String>,
}

impl Partition {
    pub fn new(section: Section, genre: Option<String>) -> Self {
        Self { section, genre }
    }

    /// Output name, e.g. `title_movie` or `title_movie_Drama`.
    pub fn file_stem(&self) -> String {
        match &self.genre {
            Some(genre) => format!("title_{}_{}", self.section, genre),
            None => format!("title_{}", self.section),
        }
    }

    pub fn matches(&self, genres: &[String]) -> bool {
        match &self.genre {
            Some(genre) => genres.iter().any(|g| g == genre),
            None => true,
        }
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.genre {
            Some(genre) => write!(f, "{}/{}", self.section, genre),
            None => write!(f, "{}/(All)", self.section),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BaseRow {
    pub id: String,
    pub name: String,
    pub genres: Vec<String>,
    pub category: Category,
    pub score: f64,
    pub votes: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeRow {
    pub base: BaseRow,
    pub series_id: String,
    pub series_name: String,
    pub season: Option<u32>,
    pub episode: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeasonRow {
    pub series_id: String,
    pub series_name: String,
    pub season: u32,
    pub score: f64,
    pub votes: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ranked<T> {
    pub row: T,
    pub ranking: f64,
    pub rank: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RowKey {
    Title(String),
    Season(String, u32),
}

pub trait Scored {
    fn id(&self) -> &str;
    fn score(&self) -> f64;
    fn votes(&self) -> f64;
    fn key(&self) -> RowKey;
}

impl Scored for BaseRow {
    fn id(&self) -> &str {
        &self.id
    }
    fn score(&self) -> f64 {
        self.score
    }
    fn votes(&self) -> f64 {
        self.votes
    }
    fn key(&self) -> RowKey {
        RowKey::Title(self.id.clone())
    }
}

impl Scored for EpisodeRow {
    fn id(&self) -> &str {
        &self.base.id
    }
    fn score(&self) -> f64 {
        self.base.score
    }
    fn votes(&self) -> f64 {
        self.base.votes
    }
    fn key(&self) -> RowKey {
        RowKey::Title(self.base.id.clone())
    }
}

impl Scored for SeasonRow {
    fn id(&self) -> &str {
        &self.series_id
    }
    fn score(&self) -> f64 {
        self.score
    }
    fn votes(&self) -> f64 {
        self.votes
    }
    fn key(&self) -> RowKey {
        RowKey::Season(self.series_id.clone(), self.season)
    }
}
