//! TSV catalog store tests
//!
//! Real files in a temp directory, with a sync double that records calls.

mod helpers;

use async_trait::async_trait;
use cinelog_common::{Error, Result};
use cinelog_web::services::{Catalog, CatalogStore, CatalogSync, TsvCatalogStore};
use helpers::record;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

#[derive(Default)]
struct RecordingSync {
    pulls: AtomicUsize,
    pushes: AtomicUsize,
    fail_pull: AtomicBool,
    fail_push: AtomicBool,
    /// Cloud copy; pull writes it over the local file when set
    remote: Mutex<Option<String>>,
}

#[async_trait]
impl CatalogSync for RecordingSync {
    async fn pull(&self, local: &Path) -> Result<()> {
        self.pulls.fetch_add(1, Ordering::SeqCst);
        if self.fail_pull.load(Ordering::SeqCst) {
            return Err(Error::Sync("drive unreachable".to_string()));
        }
        if let Some(remote) = self.remote.lock().unwrap().as_ref() {
            std::fs::write(local, remote)?;
        }
        Ok(())
    }

    async fn push(&self, local: &Path) -> Result<()> {
        self.pushes.fetch_add(1, Ordering::SeqCst);
        if self.fail_push.load(Ordering::SeqCst) {
            return Err(Error::Sync("drive unreachable".to_string()));
        }
        let mut remote = self.remote.lock().unwrap();
        if remote.is_some() {
            *remote = Some(std::fs::read_to_string(local)?);
        }
        Ok(())
    }
}

fn store_in(dir: &TempDir, sync: Arc<RecordingSync>) -> TsvCatalogStore {
    TsvCatalogStore::new(dir.path().join("Movies.tsv"), sync)
}

#[tokio::test]
async fn test_missing_file_loads_empty() {
    let dir = TempDir::new().unwrap();
    let sync = Arc::new(RecordingSync::default());
    let store = store_in(&dir, sync.clone());

    assert!(store.load_all().await.unwrap().is_empty());
    assert_eq!(sync.pulls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_save_writes_file_then_pushes() {
    let dir = TempDir::new().unwrap();
    let sync = Arc::new(RecordingSync::default());
    let store = store_in(&dir, sync.clone());

    store
        .save_all(&[record(603, "The Matrix"), record(949, "Heat")])
        .await
        .unwrap();

    assert_eq!(sync.pushes.load(Ordering::SeqCst), 1);
    let loaded = store.load_all().await.unwrap();
    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded[0].title, "The Matrix");

    let text = std::fs::read_to_string(dir.path().join("Movies.tsv")).unwrap();
    assert!(text.starts_with("ID\tTitle\tYear\tRuntime\tActors\tNotes"));
}

#[tokio::test]
async fn test_pull_failure_falls_back_to_local_copy() {
    let dir = TempDir::new().unwrap();
    let sync = Arc::new(RecordingSync::default());
    let store = store_in(&dir, sync.clone());
    store.save_all(&[record(949, "Heat")]).await.unwrap();

    sync.fail_pull.store(true, Ordering::SeqCst);
    let loaded = store.load_all().await.unwrap();

    assert_eq!(loaded.len(), 1);
}

#[tokio::test]
async fn test_push_failure_is_reported() {
    let dir = TempDir::new().unwrap();
    let sync = Arc::new(RecordingSync::default());
    sync.fail_push.store(true, Ordering::SeqCst);
    let store = store_in(&dir, sync.clone());

    let result = store.save_all(&[record(949, "Heat")]).await;

    assert!(matches!(result, Err(Error::Sync(_))));
    // The local file is still written
    assert!(dir.path().join("Movies.tsv").exists());
}

#[tokio::test]
async fn test_failed_push_is_retried_before_next_pull() {
    let dir = TempDir::new().unwrap();
    let sync = Arc::new(RecordingSync::default());
    *sync.remote.lock().unwrap() = Some("ID\tTitle\tYear\tRuntime\tActors\tNotes\n".to_string());
    let store = Arc::new(store_in(&dir, sync.clone()));
    let catalog = Catalog::new(store.clone());

    sync.fail_push.store(true, Ordering::SeqCst);
    let result = catalog.insert_if_absent(vec![record(949, "Heat")]).await;
    assert!(matches!(result, Err(Error::Sync(_))));
    assert!(store.has_unpushed_changes());

    // Drive still down: the retried insert finds the local row and nothing is pulled over it
    assert_eq!(catalog.insert_if_absent(vec![record(949, "Heat")]).await.unwrap(), 0);
    assert_eq!(sync.pulls.load(Ordering::SeqCst), 1);
    assert_eq!(sync.pushes.load(Ordering::SeqCst), 2);

    sync.fail_push.store(false, Ordering::SeqCst);
    assert_eq!(catalog.insert_if_absent(vec![record(949, "Heat")]).await.unwrap(), 0);
    assert_eq!(sync.pushes.load(Ordering::SeqCst), 3);
    assert!(!store.has_unpushed_changes());

    // Back to pulling, and the cloud copy now has the row
    let loaded = catalog.load_all().await.unwrap();
    assert_eq!(sync.pulls.load(Ordering::SeqCst), 2);
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].title, "Heat");
}

#[tokio::test]
async fn test_catalog_does_not_save_when_nothing_inserted() {
    let dir = TempDir::new().unwrap();
    let sync = Arc::new(RecordingSync::default());
    let catalog = Catalog::new(Arc::new(store_in(&dir, sync.clone())));

    assert_eq!(catalog.insert_if_absent(vec![record(949, "Heat")]).await.unwrap(), 1);
    assert_eq!(catalog.insert_if_absent(vec![record(1, "heat")]).await.unwrap(), 0);

    assert_eq!(sync.pushes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_concurrent_inserts_keep_every_title() {
    let dir = TempDir::new().unwrap();
    let catalog = Catalog::new(Arc::new(store_in(&dir, Arc::new(RecordingSync::default()))));

    let mut handles = Vec::new();
    for i in 0..8u64 {
        let catalog = catalog.clone();
        handles.push(tokio::spawn(async move {
            catalog
                .insert_if_absent(vec![record(i, &format!("Movie {}", i))])
                .await
                .unwrap()
        }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap(), 1);
    }

    assert_eq!(catalog.load_all().await.unwrap().len(), 8);
}
