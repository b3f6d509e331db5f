//! Title resolution workflow
//!
//! Turns raw titles into confirmed catalog records:
//! resolver → per-title disambiguation → batch queue controller → commit.
//! Nothing in here writes the catalog except `commit`.

pub mod commit;
pub mod detail_fetcher;
pub mod disambiguation;
pub mod queue_controller;
pub mod resolver;

pub use commit::{commit, CommitReport};
pub use detail_fetcher::DetailFetcher;
pub use disambiguation::{DisambiguationWorkflow, Resolution, TitleOutcome, TitleStep};
pub use queue_controller::{Advance, BatchController, BatchStep, Drive, NextAction};
pub use resolver::CandidateResolver;
