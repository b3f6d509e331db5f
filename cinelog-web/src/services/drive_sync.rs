//! Cloud copy of the catalog file
//!
//! The catalog file is the working copy; Google Drive holds the durable one.
//! Reads pull the Drive copy over the local file first, writes push the local
//! file back after it has been saved.

use async_trait::async_trait;
use cinelog_common::{Error, Result};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

const DRIVE_DOWNLOAD_URL: &str = "https://www.googleapis.com/drive/v3/files";
const DRIVE_UPLOAD_URL: &str = "https://www.googleapis.com/upload/drive/v3/files";
const TSV_MIME_TYPE: &str = "text/tab-separated-values";

#[async_trait]
pub trait CatalogSync: Send + Sync {
    /// Overwrite `local` with the remote copy
    async fn pull(&self, local: &Path) -> Result<()>;

    /// Overwrite the remote copy with `local`
    async fn push(&self, local: &Path) -> Result<()>;
}

/// Local-only operation
pub struct NoSync;

#[async_trait]
impl CatalogSync for NoSync {
    async fn pull(&self, _local: &Path) -> Result<()> {
        Ok(())
    }

    async fn push(&self, _local: &Path) -> Result<()> {
        Ok(())
    }
}

/// Google Drive v3 file sync
///
/// The access token is supplied by configuration; obtaining and refreshing it
/// is left to whatever deploys the service.
pub struct DriveSync {
    http_client: reqwest::Client,
    file_id: String,
    access_token: String,
}

impl DriveSync {
    pub fn new(file_id: String, access_token: String) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::Sync(format!("HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            file_id,
            access_token,
        })
    }
}

#[async_trait]
impl CatalogSync for DriveSync {
    async fn pull(&self, local: &Path) -> Result<()> {
        let url = format!("{}/{}", DRIVE_DOWNLOAD_URL, self.file_id);
        let response = self
            .http_client
            .get(&url)
            .query(&[("alt", "media")])
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| Error::Sync(format!("Drive download failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::Sync(format!(
                "Drive download returned {}",
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::Sync(format!("Drive download interrupted: {}", e)))?;
        tokio::fs::write(local, &bytes).await?;

        debug!(file_id = %self.file_id, bytes = bytes.len(), "Catalog pulled from Drive");
        Ok(())
    }

    async fn push(&self, local: &Path) -> Result<()> {
        let body = tokio::fs::read(local).await?;
        let url = format!("{}/{}", DRIVE_UPLOAD_URL, self.file_id);

        let response = self
            .http_client
            .patch(&url)
            .query(&[("uploadType", "media")])
            .bearer_auth(&self.access_token)
            .header(reqwest::header::CONTENT_TYPE, TSV_MIME_TYPE)
            .body(body)
            .send()
            .await
            .map_err(|e| Error::Sync(format!("Drive upload failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::Sync(format!(
                "Drive upload returned {}",
                response.status()
            )));
        }

        info!(file_id = %self.file_id, "Catalog pushed to Drive");
        Ok(())
    }
}
