//! Candidate resolver
//!
//! Free-text title → candidates. The metadata source is searched with the
//! title as given; its results are then filtered by comparing normalized
//! forms, keeping every result whose title *contains* the query. Broad
//! queries ("alien") therefore yield several candidates on purpose.

use cinelog_common::models::year_from_release_date;
use cinelog_common::titles::normalize_title;
use cinelog_common::Candidate;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::services::{MetadataSource, SearchHit};

#[derive(Clone)]
pub struct CandidateResolver {
    source: Arc<dyn MetadataSource>,
}

impl CandidateResolver {
    pub fn new(source: Arc<dyn MetadataSource>) -> Self {
        Self { source }
    }

    /// Candidates for `query_title` in source order
    ///
    /// Upstream failures are logged and reported as an empty list, which
    /// callers cannot distinguish from "no such movie".
    pub async fn resolve(&self, query_title: &str) -> Vec<Candidate> {
        let hits = match self.source.search_movies(query_title).await {
            Ok(hits) => hits,
            Err(e) => {
                warn!(title = %query_title, error = %e, "Title search failed");
                return Vec::new();
            }
        };

        let candidates = filter_candidates(query_title, hits);
        debug!(title = %query_title, count = candidates.len(), "Resolved candidates");
        candidates
    }
}

/// Keep hits whose normalized title contains the normalized query
pub fn filter_candidates(query_title: &str, hits: Vec<SearchHit>) -> Vec<Candidate> {
    let query = normalize_title(query_title);

    hits.into_iter()
        .filter(|hit| normalize_title(&hit.title).contains(&query))
        .map(|hit| Candidate {
            id: hit.id.into(),
            release_year: year_from_release_date(hit.release_date.as_deref()),
            title: hit.title,
        })
        .collect()
}
