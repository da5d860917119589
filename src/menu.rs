use crate::models::{Partition, Section};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::{BTreeMap, HashMap};

pub const ALL_GENRES: &str = "(All)";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MenuIndex {
    entries: Vec<(Section, Vec<(String, usize)>)>,
}

impl MenuIndex {
    pub fn sections(&self) -> impl Iterator<Item = Section> + '_ {
        self.entries.iter().map(|(s, _)| *s)
    }

    pub fn genres(&self, section: Section) -> Vec<&str> {
        self.entries
            .iter()
            .find(|(s, _)| *s == section)
            .map(|(_, g)| g.iter().map(|(label, _)| label.as_str()).collect())
            .unwrap_or_default()
    }

    pub fn get(&self, section: Section, genre: &str) -> Option<usize> {
        self.entries
            .iter()
            .find(|(s, _)| *s == section)
            .and_then(|(_, g)| g.iter().find(|(label, _)| label == genre))
            .map(|(_, size)| *size)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

struct GenreMap<'a>(&'a [(String, usize)]);

impl Serialize for GenreMap<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (label, size) in self.0 {
            map.serialize_entry(label, size)?;
        }
        map.end()
    }
}

impl Serialize for MenuIndex {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (section, genres) in &self.entries {
            map.serialize_entry(section.label(), &GenreMap(genres))?;
        }
        map.end()
    }
}

#[derive(Debug, Default)]
pub struct MenuIndexBuilder {
    recorded: HashMap<Section, BTreeMap<String, usize>>,
}

impl MenuIndexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    // Partitions that emitted no rows are left out.
    pub fn record(&mut self, partition: &Partition, emitted_rows: usize, slice_size: usize) {
        if emitted_rows == 0 {
            return;
        }
        let label = partition
            .genre
            .clone()
            .unwrap_or_else(|| ALL_GENRES.to_string());
        self.recorded
            .entry(partition.section)
            .or_default()
            .insert(label, slice_size);
    }

    pub fn finish(mut self) -> MenuIndex {
        let entries = Section::DISPLAY_ORDER
            .iter()
            .filter_map(|section| {
                let mut genres = self.recorded.remove(section)?;
                let mut ordered = Vec::with_capacity(genres.len());
                if let Some(size) = genres.remove(ALL_GENRES) {
                    ordered.push((ALL_GENRES.to_string(), size));
                }
                ordered.extend(genres);
                Some((*section, ordered))
            })
            .collect();
        MenuIndex { entries }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn partition(section: Section, genre: Option<&str>) -> Partition {
        Partition::new(section, genre.map(str::to_string))
    }

    #[test]
    fn orders_sections_and_genres() {
        let mut builder = MenuIndexBuilder::new();
        builder.record(&partition(Section::VideoGame, None), 3, 100);
        builder.record(&partition(Section::Movie, Some("Western")), 5, 100);
        builder.record(&partition(Section::Season, None), 2, 100);
        builder.record(&partition(Section::Movie, Some("Action")), 5, 100);
        builder.record(&partition(Section::Movie, None), 9, 100);

        let index = builder.finish();
        let sections: Vec<Section> = index.sections().collect();
        assert_eq!(
            sections,
            vec![Section::Movie, Section::Season, Section::VideoGame]
        );
        assert_eq!(index.genres(Section::Movie), vec!["(All)", "Action", "Western"]);
        assert_eq!(index.get(Section::Movie, "Action"), Some(100));
    }

    #[test]
    fn empty_partitions_are_not_recorded() {
        let mut builder = MenuIndexBuilder::new();
        builder.record(&partition(Section::Series, Some("Drama")), 0, 50);
        let index = builder.finish();
        assert!(index.is_empty());
        assert_eq!(index.get(Section::Series, "Drama"), None);
    }

    #[test]
    fn serializes_in_display_order() {
        let mut builder = MenuIndexBuilder::new();
        builder.record(&partition(Section::Episode, Some("Comedy")), 1, 10);
        builder.record(&partition(Section::Movie, Some("Drama")), 1, 10);
        builder.record(&partition(Section::Movie, None), 1, 10);
        let json = serde_json::to_string(&builder.finish()).unwrap();
        assert_eq!(
            json,
            r#"{"movie":{"(All)":10,"Drama":10},"episode":{"Comedy":10}}"#
        );
    }
}
