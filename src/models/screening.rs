use chrono::NaiveTime;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// One screening of a currently-showing movie, from the showtime listing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Screening {
    /// Movie title as it appears in the current-showing catalog
    #[serde(alias = "movie")]
    pub title: String,
    pub cinema: String,
    /// Town or district of the cinema
    #[serde(default)]
    pub place: Option<String>,
    /// Local start time, `HH:MM`
    #[serde(with = "hh_mm")]
    pub showtime: NaiveTime,
    /// Spoken language / subtitle code, e.g. "E/d/f"
    #[serde(default)]
    pub language: Option<String>,
}

mod hh_mm {
    use super::*;

    const FORMAT: &str = "%H:%M";

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(raw.trim(), FORMAT).map_err(serde::de::Error::custom)
    }
}
