//! Catalog data model
//!
//! A `MovieRecord` is a confirmed catalog row. A `Candidate` is a provisional
//! search hit from the metadata source that has not been confirmed yet.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Opaque identifier assigned by the metadata source
///
/// TMDb hands out integers, the catalog file stores text; both end up here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct MovieId(pub String);

impl MovieId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MovieId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<u64> for MovieId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for MovieId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// One row of the movie catalog
///
/// Field names match the column headers of `Movies.tsv`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovieRecord {
    #[serde(rename = "ID")]
    pub id: MovieId,
    #[serde(rename = "Title")]
    pub title: String,
    /// Four-digit release year, or empty
    #[serde(rename = "Year", default)]
    pub year: String,
    /// Runtime in minutes; hand-edited text that is not a number reads as `None`
    #[serde(rename = "Runtime", default, deserialize_with = "lenient_runtime")]
    pub runtime: Option<u32>,
    /// Cast names joined with ", "
    #[serde(rename = "Actors", default)]
    pub actors: String,
    #[serde(rename = "Notes", default)]
    pub notes: String,
}

impl MovieRecord {
    /// Catalog identity: titles compare case-insensitively, IDs are ignored
    pub fn has_title(&self, title: &str) -> bool {
        self.title.to_lowercase() == title.to_lowercase()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawRuntime {
    Minutes(u64),
    Fractional(f64),
    Text(String),
}

fn lenient_runtime<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let minutes = match Option::<RawRuntime>::deserialize(deserializer)? {
        None => None,
        Some(RawRuntime::Minutes(minutes)) => u32::try_from(minutes).ok(),
        Some(RawRuntime::Fractional(minutes)) if minutes.is_finite() && minutes >= 0.0 => {
            Some(minutes.round() as u32)
        }
        Some(RawRuntime::Fractional(_)) => None,
        Some(RawRuntime::Text(text)) => {
            let text = text.trim();
            if text.is_empty() {
                return Ok(None);
            }
            match text.parse::<u32>() {
                Ok(minutes) => Some(minutes),
                Err(_) => {
                    tracing::warn!(runtime = text, "Ignoring runtime that is not a number of minutes");
                    None
                }
            }
        }
    };
    Ok(minutes)
}

/// Unconfirmed match returned by a title search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: MovieId,
    pub title: String,
    /// Year part of the release date, empty when the source has none
    pub release_year: String,
}

/// Year portion of a `YYYY-MM-DD` release date
///
/// Returns everything before the first `-`, or an empty string when the
/// source reported no date.
pub fn year_from_release_date(release_date: Option<&str>) -> String {
    release_date
        .filter(|d| !d.is_empty())
        .and_then(|d| d.split('-').next())
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_year_from_release_date() {
        assert_eq!(year_from_release_date(Some("1999-03-30")), "1999");
        assert_eq!(year_from_release_date(Some("2003")), "2003");
        assert_eq!(year_from_release_date(Some("")), "");
        assert_eq!(year_from_release_date(None), "");
    }

    #[test]
    fn test_has_title_ignores_case_and_id() {
        let record = MovieRecord {
            id: MovieId::from(603u64),
            title: "The Matrix".to_string(),
            year: "1999".to_string(),
            runtime: Some(136),
            actors: String::new(),
            notes: String::new(),
        };

        assert!(record.has_title("the matrix"));
        assert!(record.has_title("THE MATRIX"));
        assert!(!record.has_title("The Matrix Reloaded"));
    }

    #[test]
    fn test_runtime_reads_numbers_and_ignores_text() {
        let numeric: MovieRecord =
            serde_json::from_str(r#"{"ID":"603","Title":"The Matrix","Runtime":136}"#).unwrap();
        assert_eq!(numeric.runtime, Some(136));

        let text: MovieRecord =
            serde_json::from_str(r#"{"ID":"1","Title":"Heat","Runtime":"2h 50m"}"#).unwrap();
        assert_eq!(text.runtime, None);

        let missing: MovieRecord = serde_json::from_str(r#"{"ID":"1","Title":"Heat"}"#).unwrap();
        assert_eq!(missing.runtime, None);
    }

    #[test]
    fn test_movie_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&MovieId::from(603u64)).unwrap();
        assert_eq!(json, "\"603\"");
    }
}
