use serde::{Deserialize, Deserializer, Serialize};

/// Metadata for one movie as delivered by the metadata collaborator
///
/// Rows are keyed by `original_title` when they carry one; `title` is the
/// fallback for collaborators that only send the display title.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(try_from = "MovieRecordWire")]
pub struct MovieRecord {
    /// Title, unique within a catalog after deduplication
    pub title: String,
    /// Short marketing line
    pub tagline: Option<String>,
    /// Free-text plot overview; records without one are never embedded
    pub overview: Option<String>,
    /// Genre names in source order
    pub genre_list: Vec<String>,
}

#[derive(Deserialize)]
struct MovieRecordWire {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    original_title: Option<String>,
    #[serde(default)]
    tagline: Option<String>,
    #[serde(default)]
    overview: Option<String>,
    #[serde(default, alias = "genres", deserialize_with = "deserialize_genres")]
    genre_list: Vec<String>,
}

impl TryFrom<MovieRecordWire> for MovieRecord {
    type Error = String;

    fn try_from(wire: MovieRecordWire) -> Result<Self, Self::Error> {
        let title = wire
            .original_title
            .or(wire.title)
            .ok_or_else(|| "movie row has neither `original_title` nor `title`".to_string())?;

        Ok(Self {
            title,
            tagline: wire.tagline,
            overview: wire.overview,
            genre_list: wire.genre_list,
        })
    }
}

impl MovieRecord {
    /// Creates a record with no genres
    pub fn new(title: impl Into<String>, tagline: Option<&str>, overview: Option<&str>) -> Self {
        Self {
            title: title.into(),
            tagline: tagline.map(str::to_string),
            overview: overview.map(str::to_string),
            genre_list: Vec::new(),
        }
    }

    /// Sets the genre list
    pub fn with_genres<I, S>(mut self, genres: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.genre_list = genres.into_iter().map(Into::into).collect();
        self
    }

    /// True when the record carries an overview to describe the movie with
    pub fn has_overview(&self) -> bool {
        self.overview.is_some()
    }
}

/// A historical catalog row, which additionally carries a popularity score
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoricalMovie {
    #[serde(flatten)]
    pub record: MovieRecord,
    /// Popularity score; higher wins when titles collide
    #[serde(default)]
    pub popularity: f64,
}

impl HistoricalMovie {
    pub fn new(record: MovieRecord, popularity: f64) -> Self {
        Self { record, popularity }
    }
}

/// Genre list wire formats accepted from the metadata collaborator
#[derive(Deserialize)]
#[serde(untagged)]
enum GenreWire {
    Names(Vec<String>),
    Objects(Vec<GenreObject>),
    /// TMDB export: the object list JSON-encoded as a string
    Encoded(String),
}

#[derive(Deserialize)]
struct GenreObject {
    name: String,
}

fn deserialize_genres<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let wire: Option<GenreWire> = Option::deserialize(deserializer)?;

    match wire {
        None => Ok(Vec::new()),
        Some(GenreWire::Names(names)) => Ok(names),
        Some(GenreWire::Objects(objects)) => Ok(objects.into_iter().map(|g| g.name).collect()),
        Some(GenreWire::Encoded(raw)) => {
            if raw.trim().is_empty() {
                return Ok(Vec::new());
            }
            let objects: Vec<GenreObject> =
                serde_json::from_str(&raw).map_err(serde::de::Error::custom)?;
            Ok(objects.into_iter().map(|g| g.name).collect())
        }
    }
}
