//! Catalog persistence
//!
//! `CatalogStore` is the load-all / save-all boundary. `Catalog` layers the
//! record-level operations on top and serializes every load-modify-save
//! behind one write lock, so two requests editing the catalog at once cannot
//! lose each other's changes.

use async_trait::async_trait;
use cinelog_common::catalog_file::{read_catalog, write_catalog};
use cinelog_common::{MovieId, MovieRecord, Result};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use super::drive_sync::CatalogSync;

#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn load_all(&self) -> Result<Vec<MovieRecord>>;

    async fn save_all(&self, records: &[MovieRecord]) -> Result<()>;
}

/// Tab-separated file with cloud sync
///
/// After a failed push the local file is ahead of the cloud copy. Until a
/// push succeeds, loads push instead of pulling so those rows are not
/// overwritten.
pub struct TsvCatalogStore {
    path: PathBuf,
    sync: Arc<dyn CatalogSync>,
    push_pending: AtomicBool,
}

impl TsvCatalogStore {
    pub fn new(path: PathBuf, sync: Arc<dyn CatalogSync>) -> Self {
        Self {
            path,
            sync,
            push_pending: AtomicBool::new(false),
        }
    }

    /// True while the local file holds changes the cloud copy lacks
    pub fn has_unpushed_changes(&self) -> bool {
        self.push_pending.load(Ordering::SeqCst)
    }

    async fn push(&self) -> Result<()> {
        match self.sync.push(&self.path).await {
            Ok(()) => {
                if self.push_pending.swap(false, Ordering::SeqCst) {
                    info!(path = %self.path.display(), "Pending catalog changes pushed");
                }
                Ok(())
            }
            Err(e) => {
                self.push_pending.store(true, Ordering::SeqCst);
                Err(e)
            }
        }
    }
}

#[async_trait]
impl CatalogStore for TsvCatalogStore {
    async fn load_all(&self) -> Result<Vec<MovieRecord>> {
        if self.has_unpushed_changes() {
            if let Err(e) = self.push().await {
                warn!(error = %e, "Catalog push retry failed, keeping local copy");
            }
        } else if let Err(e) = self.sync.pull(&self.path).await {
            warn!(error = %e, "Catalog pull failed, using local copy");
        }
        read_catalog(&self.path)
    }

    async fn save_all(&self, records: &[MovieRecord]) -> Result<()> {
        write_catalog(&self.path, records)?;
        self.push().await
    }
}

/// In-memory store, used when no catalog file is wanted
#[derive(Default)]
pub struct MemoryCatalogStore {
    records: Mutex<Vec<MovieRecord>>,
}

impl MemoryCatalogStore {
    pub fn new(records: Vec<MovieRecord>) -> Self {
        Self {
            records: Mutex::new(records),
        }
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalogStore {
    async fn load_all(&self) -> Result<Vec<MovieRecord>> {
        Ok(self.records.lock().await.clone())
    }

    async fn save_all(&self, records: &[MovieRecord]) -> Result<()> {
        *self.records.lock().await = records.to_vec();
        Ok(())
    }
}

/// Changes to apply to an existing record; `None` keeps the old value
#[derive(Debug, Clone, Default)]
pub struct RecordEdit {
    pub title: Option<String>,
    pub year: Option<String>,
    pub runtime: Option<Option<u32>>,
    pub actors: Option<String>,
    pub notes: Option<String>,
}

/// Record-level catalog operations
#[derive(Clone)]
pub struct Catalog {
    store: Arc<dyn CatalogStore>,
    write_lock: Arc<Mutex<()>>,
}

impl Catalog {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self {
            store,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub async fn load_all(&self) -> Result<Vec<MovieRecord>> {
        self.store.load_all().await
    }

    /// First record whose title matches case-insensitively
    pub async fn find_by_title(&self, title: &str) -> Result<Option<MovieRecord>> {
        Ok(self
            .store
            .load_all()
            .await?
            .into_iter()
            .find(|record| record.has_title(title)))
    }

    /// Prepend each record whose title is not yet present
    ///
    /// Returns the number of records actually inserted. Titles within
    /// `records` are also checked against each other. Nothing is saved when
    /// every record was already present.
    pub async fn insert_if_absent(&self, records: Vec<MovieRecord>) -> Result<usize> {
        let _guard = self.write_lock.lock().await;

        let mut catalog = self.store.load_all().await?;
        let mut inserted = 0;
        for record in records {
            if catalog.iter().any(|existing| existing.has_title(&record.title)) {
                info!(title = %record.title, "Already in catalog, skipping");
                continue;
            }
            catalog.insert(0, record);
            inserted += 1;
        }

        if inserted > 0 {
            self.store.save_all(&catalog).await?;
        }
        Ok(inserted)
    }

    /// Overwrite the whole catalog
    pub async fn replace_all(&self, records: Vec<MovieRecord>) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.store.save_all(&records).await
    }

    /// Apply `edit` to the first record titled `title`
    ///
    /// Returns the updated record, or `None` when no record matched.
    pub async fn edit_by_title(&self, title: &str, edit: RecordEdit) -> Result<Option<MovieRecord>> {
        let _guard = self.write_lock.lock().await;

        let mut catalog = self.store.load_all().await?;
        let Some(record) = catalog.iter_mut().find(|r| r.has_title(title)) else {
            return Ok(None);
        };

        if let Some(title) = edit.title {
            record.title = title;
        }
        if let Some(year) = edit.year {
            record.year = year;
        }
        if let Some(runtime) = edit.runtime {
            record.runtime = runtime;
        }
        if let Some(actors) = edit.actors {
            record.actors = actors;
        }
        if let Some(notes) = edit.notes {
            record.notes = notes;
        }
        let updated = record.clone();

        self.store.save_all(&catalog).await?;
        Ok(Some(updated))
    }

    /// Remove every record with `id`; returns how many were removed
    pub async fn delete_by_id(&self, id: &MovieId) -> Result<usize> {
        let _guard = self.write_lock.lock().await;

        let catalog = self.store.load_all().await?;
        let before = catalog.len();
        let remaining: Vec<MovieRecord> = catalog.into_iter().filter(|r| &r.id != id).collect();
        let removed = before - remaining.len();

        if removed > 0 {
            self.store.save_all(&remaining).await?;
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: u64, title: &str) -> MovieRecord {
        MovieRecord {
            id: MovieId::from(id),
            title: title.to_string(),
            year: String::new(),
            runtime: None,
            actors: String::new(),
            notes: String::new(),
        }
    }

    fn catalog_with(records: Vec<MovieRecord>) -> Catalog {
        Catalog::new(Arc::new(MemoryCatalogStore::new(records)))
    }

    #[tokio::test]
    async fn test_insert_if_absent_prepends_and_skips_duplicates() {
        let catalog = catalog_with(vec![record(1, "Speed")]);

        let inserted = catalog
            .insert_if_absent(vec![record(2, "The Matrix"), record(3, "SPEED"), record(4, "Heat")])
            .await
            .unwrap();

        assert_eq!(inserted, 2);
        let titles: Vec<String> = catalog.load_all().await.unwrap().into_iter().map(|r| r.title).collect();
        assert_eq!(titles, vec!["Heat", "The Matrix", "Speed"]);
    }

    #[tokio::test]
    async fn test_insert_if_absent_dedupes_within_batch() {
        let catalog = catalog_with(Vec::new());
        let inserted = catalog
            .insert_if_absent(vec![record(1, "Heat"), record(2, "heat")])
            .await
            .unwrap();
        assert_eq!(inserted, 1);
    }

    #[tokio::test]
    async fn test_find_by_title_is_case_insensitive() {
        let catalog = catalog_with(vec![record(603, "The Matrix")]);
        let found = catalog.find_by_title("the MATRIX").await.unwrap();
        assert_eq!(found.map(|r| r.id), Some(MovieId::from(603u64)));
        assert!(catalog.find_by_title("Matrix").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_edit_keeps_unspecified_fields() {
        let mut original = record(603, "The Matrix");
        original.year = "1999".to_string();
        let catalog = catalog_with(vec![original]);

        let updated = catalog
            .edit_by_title(
                "the matrix",
                RecordEdit {
                    notes: Some("Watched twice".to_string()),
                    runtime: Some(Some(136)),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.year, "1999");
        assert_eq!(updated.notes, "Watched twice");
        assert_eq!(updated.runtime, Some(136));
        assert!(catalog.edit_by_title("Heat", RecordEdit::default()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_by_id() {
        let catalog = catalog_with(vec![record(1, "Heat"), record(2, "Speed")]);
        assert_eq!(catalog.delete_by_id(&MovieId::from(2u64)).await.unwrap(), 1);
        assert_eq!(catalog.delete_by_id(&MovieId::from(2u64)).await.unwrap(), 0);
        assert_eq!(catalog.load_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_replace_all_overwrites_catalog() {
        let catalog = catalog_with(vec![record(1, "Heat")]);
        catalog
            .replace_all(vec![record(2, "Speed"), record(3, "Ronin")])
            .await
            .unwrap();

        let titles: Vec<String> = catalog.load_all().await.unwrap().into_iter().map(|r| r.title).collect();
        assert_eq!(titles, vec!["Speed", "Ronin"]);
    }
}
