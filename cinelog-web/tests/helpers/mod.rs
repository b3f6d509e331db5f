//! Test Helper Utilities
//!
//! In-memory stand-ins for TMDb and Gemini, plus app state over an
//! in-memory session database.

#![allow(dead_code)]

use async_trait::async_trait;
use cinelog_common::{MovieId, MovieRecord};
use cinelog_web::services::{
    CastMember, Catalog, Credits, MemoryCatalogStore, MetadataError, MetadataSource,
    MovieDetails, SearchHit, TitleExtractor,
};
use cinelog_web::AppState;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// One movie known to the fake metadata source
#[derive(Debug, Clone)]
pub struct FakeMovie {
    pub id: u64,
    pub title: &'static str,
    pub release_date: Option<&'static str>,
    pub runtime: Option<u32>,
    pub cast: Vec<&'static str>,
}

pub fn movie(id: u64, title: &'static str, release_date: &'static str) -> FakeMovie {
    FakeMovie {
        id,
        title,
        release_date: Some(release_date),
        runtime: Some(120),
        cast: vec!["Lead Actor", "Supporting Actor"],
    }
}

/// Movies every test source knows about
pub fn standard_movies() -> Vec<FakeMovie> {
    vec![
        FakeMovie {
            id: 603,
            title: "The Matrix",
            release_date: Some("1999-03-30"),
            runtime: Some(136),
            cast: vec!["Keanu Reeves", "Laurence Fishburne"],
        },
        movie(604, "The Matrix Reloaded", "2003-05-15"),
        movie(949, "Heat", "1995-12-15"),
        movie(1637, "Speed", "1994-06-09"),
        movie(348, "Alien", "1979-05-25"),
        movie(679, "Aliens", "1986-07-18"),
    ]
}

/// Metadata source answering from a fixed movie list
///
/// Search matches every movie whose lowercase title contains the lowercase
/// query, roughly like TMDb's own fuzzy search.
pub struct FakeMetadataSource {
    pub movies: Vec<FakeMovie>,
    /// Ids whose detail lookup fails
    pub broken_details: Vec<u64>,
    /// Every search fails
    pub offline: bool,
    pub searches: AtomicUsize,
}

impl FakeMetadataSource {
    pub fn new(movies: Vec<FakeMovie>) -> Self {
        Self {
            movies,
            broken_details: Vec::new(),
            offline: false,
            searches: AtomicUsize::new(0),
        }
    }

    pub fn standard() -> Self {
        Self::new(standard_movies())
    }

    pub fn search_count(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }

    fn find(&self, id: &MovieId) -> Result<&FakeMovie, MetadataError> {
        self.movies
            .iter()
            .find(|m| m.id.to_string() == id.as_str())
            .filter(|m| !self.broken_details.contains(&m.id))
            .ok_or_else(|| MetadataError::Api(404, format!("movie {} not found", id)))
    }
}

#[async_trait]
impl MetadataSource for FakeMetadataSource {
    async fn search_movies(&self, title: &str) -> Result<Vec<SearchHit>, MetadataError> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        if self.offline {
            return Err(MetadataError::Network("connection refused".to_string()));
        }

        let query = title.to_lowercase();
        Ok(self
            .movies
            .iter()
            .filter(|m| m.title.to_lowercase().contains(&query))
            .map(|m| SearchHit {
                id: m.id,
                title: m.title.to_string(),
                release_date: m.release_date.map(str::to_string),
            })
            .collect())
    }

    async fn movie(&self, id: &MovieId) -> Result<MovieDetails, MetadataError> {
        let m = self.find(id)?;
        Ok(MovieDetails {
            id: m.id,
            title: m.title.to_string(),
            release_date: m.release_date.map(str::to_string),
            runtime: m.runtime,
        })
    }

    async fn credits(&self, id: &MovieId) -> Result<Credits, MetadataError> {
        let m = self.find(id)?;
        Ok(Credits {
            cast: m
                .cast
                .iter()
                .map(|name| CastMember {
                    name: name.to_string(),
                })
                .collect(),
        })
    }
}

/// Extractor returning the same titles for every image
pub struct FakeExtractor(pub Vec<String>);

#[async_trait]
impl TitleExtractor for FakeExtractor {
    async fn extract_titles(&self, _image: &[u8]) -> Vec<String> {
        self.0.clone()
    }
}

pub fn record(id: u64, title: &str) -> MovieRecord {
    MovieRecord {
        id: MovieId::from(id),
        title: title.to_string(),
        year: String::new(),
        runtime: None,
        actors: String::new(),
        notes: String::new(),
    }
}

pub fn memory_catalog(records: Vec<MovieRecord>) -> Catalog {
    Catalog::new(Arc::new(MemoryCatalogStore::new(records)))
}

pub const TEST_PASSWORD: &str = "let-me-in";

/// App state over an in-memory session database
pub async fn test_app_state(
    catalog: Catalog,
    source: Arc<FakeMetadataSource>,
    extracted: Vec<String>,
) -> AppState {
    let db_pool = sqlx::SqlitePool::connect(":memory:").await.unwrap();
    cinelog_web::db::init_tables(&db_pool).await.unwrap();

    AppState::new(
        db_pool,
        catalog,
        source,
        Arc::new(FakeExtractor(extracted)),
        TEST_PASSWORD,
    )
}
