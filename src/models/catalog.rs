use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One movie's describable text
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CorpusEntry {
    pub title: String,
    pub description: String,
}

impl CorpusEntry {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }
}

/// Ordered, title-deduplicated list of corpus entries
///
/// Row order is the canonical index used by the similarity matrix. The last
/// entry seen for a title wins and sits at its own position; the earlier
/// occurrence is removed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<CorpusEntry>", into = "Vec<CorpusEntry>")]
pub struct Catalog {
    entries: Vec<CorpusEntry>,
    positions: HashMap<String, usize>,
}

impl Catalog {
    /// Creates an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry, dropping any earlier entry with the same title
    pub fn push_latest(&mut self, entry: CorpusEntry) {
        if let Some(row) = self.positions.remove(&entry.title) {
            self.entries.remove(row);
            for position in self.positions.values_mut() {
                if *position > row {
                    *position -= 1;
                }
            }
        }

        self.positions.insert(entry.title.clone(), self.entries.len());
        self.entries.push(entry);
    }

    /// Row index of a title
    pub fn position(&self, title: &str) -> Option<usize> {
        self.positions.get(title).copied()
    }

    pub fn contains(&self, title: &str) -> bool {
        self.positions.contains_key(title)
    }

    pub fn get(&self, row: usize) -> Option<&CorpusEntry> {
        self.entries.get(row)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[CorpusEntry] {
        &self.entries
    }

    /// Titles in row order
    pub fn titles(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.title.as_str())
    }

    /// Descriptions in row order
    pub fn descriptions(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.description.as_str())
    }
}

impl FromIterator<CorpusEntry> for Catalog {
    fn from_iter<I: IntoIterator<Item = CorpusEntry>>(iter: I) -> Self {
        let mut catalog = Catalog::new();
        for entry in iter {
            catalog.push_latest(entry);
        }
        catalog
    }
}

impl From<Vec<CorpusEntry>> for Catalog {
    fn from(entries: Vec<CorpusEntry>) -> Self {
        entries.into_iter().collect()
    }
}

impl From<Catalog> for Vec<CorpusEntry> {
    fn from(catalog: Catalog) -> Self {
        catalog.entries
    }
}
