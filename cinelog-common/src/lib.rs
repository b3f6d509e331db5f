//! # cinelog Common Library
//!
//! Shared code for the cinelog web service and its companion commands:
//! - Movie catalog model (MovieRecord, Candidate)
//! - Catalog file codec (tab-separated Movies.tsv)
//! - Title normalization and free-text title search
//! - Bootstrap configuration loading

pub mod catalog_file;
pub mod config;
pub mod error;
pub mod models;
pub mod titles;

pub use error::{Error, Result};
pub use models::{Candidate, MovieId, MovieRecord};
