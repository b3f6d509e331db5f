//! Final confirmation
//!
//! The only workflow step that writes the catalog. Each entry is re-fetched
//! from the metadata source (the confirmation set may have sat in a session
//! for a while) and inserted unless its title is already present.

use cinelog_common::Result;
use serde::Serialize;
use tracing::info;

use super::detail_fetcher::DetailFetcher;
use crate::models::PendingConfirmationSet;
use crate::services::Catalog;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CommitReport {
    /// Titles that were genuinely new
    pub inserted: usize,
    /// Entries already present or no longer retrievable
    pub skipped: usize,
}

/// Insert the confirmed records, newest first
pub async fn commit(
    set: &PendingConfirmationSet,
    fetcher: &DetailFetcher,
    catalog: &Catalog,
) -> Result<CommitReport> {
    let mut records = Vec::with_capacity(set.len());
    for entry in set.entries() {
        if let Some(record) = fetcher.fetch_details(&entry.record.id).await {
            records.push(record);
        }
    }

    let inserted = catalog.insert_if_absent(records).await?;
    let report = CommitReport {
        inserted,
        skipped: set.len() - inserted,
    };

    info!(inserted = report.inserted, skipped = report.skipped, "Batch committed");
    Ok(report)
}
