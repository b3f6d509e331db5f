//! External collaborators: metadata source, image extractor, catalog storage

pub mod catalog_store;
pub mod drive_sync;
pub mod gemini_client;
pub mod tmdb_client;

pub use catalog_store::{Catalog, CatalogStore, MemoryCatalogStore, RecordEdit, TsvCatalogStore};
pub use drive_sync::{CatalogSync, DriveSync, NoSync};
pub use gemini_client::{DisabledExtractor, GeminiClient, TitleExtractor};
pub use tmdb_client::{CastMember, Credits, MetadataError, MetadataSource, MovieDetails, SearchHit, TmdbClient};
