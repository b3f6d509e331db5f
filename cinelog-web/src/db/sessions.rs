//! Login session persistence
//!
//! One row per login. The batch in progress and the last catalog search are
//! stored next to it as JSON, so a request can pick up where the previous
//! one left off. Deleting the row (logout) discards both.

use chrono::Utc;
use cinelog_common::{Error, MovieRecord, Result};
use serde::{de::DeserializeOwned, Serialize};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::models::BatchSession;

/// Create a session row and return its id
pub async fn create_session(pool: &SqlitePool) -> Result<Uuid> {
    let session_id = Uuid::new_v4();

    sqlx::query("INSERT INTO web_sessions (session_id, created_at) VALUES (?, ?)")
        .bind(session_id.to_string())
        .bind(Utc::now().to_rfc3339())
        .execute(pool)
        .await?;

    tracing::info!(session_id = %session_id, "Session created");
    Ok(session_id)
}

pub async fn session_exists(pool: &SqlitePool, session_id: Uuid) -> Result<bool> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM web_sessions WHERE session_id = ?")
        .bind(session_id.to_string())
        .fetch_one(pool)
        .await?;
    Ok(count > 0)
}

pub async fn delete_session(pool: &SqlitePool, session_id: Uuid) -> Result<()> {
    sqlx::query("DELETE FROM web_sessions WHERE session_id = ?")
        .bind(session_id.to_string())
        .execute(pool)
        .await?;

    tracing::info!(session_id = %session_id, "Session deleted");
    Ok(())
}

pub async fn load_batch(pool: &SqlitePool, session_id: Uuid) -> Result<Option<BatchSession>> {
    load_column(pool, session_id, "batch").await
}

pub async fn save_batch(pool: &SqlitePool, session_id: Uuid, batch: &BatchSession) -> Result<()> {
    save_column(pool, session_id, "batch", Some(batch)).await
}

pub async fn clear_batch(pool: &SqlitePool, session_id: Uuid) -> Result<()> {
    save_column::<BatchSession>(pool, session_id, "batch", None).await
}

pub async fn load_search(pool: &SqlitePool, session_id: Uuid) -> Result<Option<Vec<MovieRecord>>> {
    load_column(pool, session_id, "search_results").await
}

pub async fn save_search(pool: &SqlitePool, session_id: Uuid, results: &[MovieRecord]) -> Result<()> {
    save_column(pool, session_id, "search_results", Some(&results)).await
}

pub async fn clear_search(pool: &SqlitePool, session_id: Uuid) -> Result<()> {
    save_column::<Vec<MovieRecord>>(pool, session_id, "search_results", None).await
}

// `column` is always one of the fixed names above, never user input
async fn load_column<T: DeserializeOwned>(
    pool: &SqlitePool,
    session_id: Uuid,
    column: &str,
) -> Result<Option<T>> {
    let row = sqlx::query(&format!(
        "SELECT {} AS value FROM web_sessions WHERE session_id = ?",
        column
    ))
    .bind(session_id.to_string())
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };
    let value: Option<String> = row.get("value");

    value
        .map(|json| {
            serde_json::from_str(&json)
                .map_err(|e| Error::SessionState(format!("Failed to deserialize {}: {}", column, e)))
        })
        .transpose()
}

async fn save_column<T: Serialize>(
    pool: &SqlitePool,
    session_id: Uuid,
    column: &str,
    value: Option<&T>,
) -> Result<()> {
    let json = value
        .map(|v| {
            serde_json::to_string(v)
                .map_err(|e| Error::SessionState(format!("Failed to serialize {}: {}", column, e)))
        })
        .transpose()?;

    sqlx::query(&format!(
        "UPDATE web_sessions SET {} = ? WHERE session_id = ?",
        column
    ))
    .bind(json)
    .bind(session_id.to_string())
    .execute(pool)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BatchState;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePool::connect(":memory:").await.unwrap();
        crate::db::init_tables(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn test_session_lifecycle() {
        let pool = test_pool().await;
        let id = create_session(&pool).await.unwrap();
        assert!(session_exists(&pool, id).await.unwrap());

        delete_session(&pool, id).await.unwrap();
        assert!(!session_exists(&pool, id).await.unwrap());
    }

    #[tokio::test]
    async fn test_batch_round_trip_and_clear() {
        let pool = test_pool().await;
        let id = create_session(&pool).await.unwrap();
        assert!(load_batch(&pool, id).await.unwrap().is_none());

        let batch = BatchSession::Draining(BatchState::from_titles(["Heat", "Speed"], &[]));
        save_batch(&pool, id, &batch).await.unwrap();
        assert_eq!(load_batch(&pool, id).await.unwrap(), Some(batch));

        clear_batch(&pool, id).await.unwrap();
        assert!(load_batch(&pool, id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unknown_session_has_no_state() {
        let pool = test_pool().await;
        assert!(load_search(&pool, Uuid::new_v4()).await.unwrap().is_none());
    }
}
