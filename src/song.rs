use serde::{Deserialize, Deserializer, Serialize};

use crate::time::parse_minutes_seconds;

/// The track a playlist asks for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    pub title: String,
    pub artist: String,
    pub album: String,
    /// Duration in seconds
    #[serde(deserialize_with = "deserialize_time")]
    pub time: u32,
}

/// One hit returned by a search provider for a song query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    /// Duration in seconds. Some providers (soundcloud) don't report one.
    #[serde(default)]
    pub time: Option<u32>,
}

impl Song {
    /// Text the search result titles are compared against: `"{title} {artist}"`.
    pub fn reference_text(&self) -> String {
        format!("{} {}", self.title, self.artist)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTime {
    Seconds(u32),
    MinutesSeconds(String),
}

/// Accepts either integer seconds or a `"mm:ss"` string.
fn deserialize_time<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    match RawTime::deserialize(deserializer)? {
        RawTime::Seconds(seconds) => Ok(seconds),
        RawTime::MinutesSeconds(text) => {
            parse_minutes_seconds(&text).map_err(serde::de::Error::custom)
        }
    }
}
