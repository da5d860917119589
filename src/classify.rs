use crate::models::{Category, Title};

const TYPE_TABLE: &[(&str, Category)] = &[
    ("movie", Category::Movie),
    ("tvMovie", Category::Movie),
    ("tvSeries", Category::Series),
    ("tvMiniSeries", Category::Series),
    ("tvEpisode", Category::Episode),
    ("videoGame", Category::VideoGame),
];

pub const DEFAULT_EXCLUDED_GENRE: &str = "Adult";

pub fn classify(type_tag: &str) -> Option<Category> {
    TYPE_TABLE
        .iter()
        .find(|(tag, _)| *tag == type_tag)
        .map(|(_, category)| *category)
}

pub fn is_excluded(title: &Title, excluded_genre: &str) -> bool {
    title.genres.iter().any(|g| g == excluded_genre)
}

pub fn classify_title(title: &Title, excluded_genre: &str) -> Option<Category> {
    if is_excluded(title, excluded_genre) {
        return None;
    }
    classify(&title.title_type)
}
