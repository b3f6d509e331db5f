//! Detail fetcher
//!
//! Expands a candidate id into a full `MovieRecord` with two dependent
//! lookups: core metadata, then credits.

use cinelog_common::models::year_from_release_date;
use cinelog_common::{MovieId, MovieRecord};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::services::{Credits, MetadataSource, MovieDetails};

#[derive(Clone)]
pub struct DetailFetcher {
    source: Arc<dyn MetadataSource>,
}

impl DetailFetcher {
    pub fn new(source: Arc<dyn MetadataSource>) -> Self {
        Self { source }
    }

    /// Full record for `id`, or `None` if either lookup failed
    pub async fn fetch_details(&self, id: &MovieId) -> Option<MovieRecord> {
        let details = match self.source.movie(id).await {
            Ok(details) => details,
            Err(e) => {
                warn!(id = %id, error = %e, "Movie details lookup failed");
                return None;
            }
        };

        let credits = match self.source.credits(id).await {
            Ok(credits) => credits,
            Err(e) => {
                warn!(id = %id, error = %e, "Movie credits lookup failed");
                return None;
            }
        };

        let record = build_record(details, credits);
        debug!(id = %record.id, title = %record.title, "Fetched movie details");
        Some(record)
    }
}

fn build_record(details: MovieDetails, credits: Credits) -> MovieRecord {
    let actors: Vec<String> = credits.cast.into_iter().map(|member| member.name).collect();

    MovieRecord {
        id: details.id.into(),
        year: year_from_release_date(details.release_date.as_deref()),
        title: details.title,
        runtime: details.runtime,
        actors: actors.join(", "),
        notes: String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::tmdb_client::CastMember;

    #[test]
    fn test_build_record_joins_cast_in_order() {
        let details = MovieDetails {
            id: 603,
            title: "The Matrix".to_string(),
            release_date: Some("1999-03-30".to_string()),
            runtime: Some(136),
        };
        let credits = Credits {
            cast: vec![
                CastMember { name: "Keanu Reeves".to_string() },
                CastMember { name: "Laurence Fishburne".to_string() },
            ],
        };

        let record = build_record(details, credits);

        assert_eq!(record.id.as_str(), "603");
        assert_eq!(record.year, "1999");
        assert_eq!(record.runtime, Some(136));
        assert_eq!(record.actors, "Keanu Reeves, Laurence Fishburne");
        assert_eq!(record.notes, "");
    }

    #[test]
    fn test_build_record_without_release_date() {
        let details = MovieDetails {
            id: 7,
            title: "Untitled".to_string(),
            release_date: None,
            runtime: None,
        };
        let record = build_record(details, Credits::default());
        assert_eq!(record.year, "");
        assert_eq!(record.actors, "");
    }
}
