//! Batch add endpoints
//!
//! A batch is started from a photo, a typed list or a single title, then
//! driven one request at a time: each response is either a choice to make
//! for the head title or the confirmation set once the queue has drained.
//! The batch lives in the login session between requests.

use axum::{
    body::Bytes,
    extract::State,
    routing::{get, post},
    Json, Router,
};
use cinelog_common::titles::{fold_quotes, normalize_title};
use cinelog_common::{Candidate, MovieId};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use super::auth::LoggedIn;
use crate::db::sessions;
use crate::models::{BatchSession, BatchState, ConfirmationEntry, Notice, UserInput};
use crate::workflow::{self, BatchStep};
use crate::{ApiError, ApiResult, AppState};

/// Where the session's batch stands
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepView {
    /// No batch in progress
    Idle,
    AwaitingChoice {
        title: String,
        candidates: Vec<Candidate>,
        /// Titles still queued, including this one
        remaining: usize,
    },
    Confirming {
        entries: Vec<ConfirmationEntry>,
    },
}

#[derive(Debug, Serialize)]
pub struct StepResponse {
    #[serde(flatten)]
    pub step: StepView,
    pub notices: Vec<Notice>,
}

impl StepResponse {
    fn idle(notices: Vec<Notice>) -> Self {
        Self {
            step: StepView::Idle,
            notices,
        }
    }
}

/// Drive `batch` as far as it goes and store where it stopped
async fn run_batch(
    state: &AppState,
    session_id: Uuid,
    batch: BatchState,
    input: Option<UserInput>,
) -> ApiResult<StepResponse> {
    let drive = state.controller.drive(batch, input).await;
    let mut notices = drive.notices;

    let step = match drive.step {
        BatchStep::AwaitingChoice {
            state: batch,
            title,
            candidates,
        } => {
            let remaining = batch.queue.len();
            sessions::save_batch(&state.db, session_id, &BatchSession::Draining(batch)).await?;
            StepView::AwaitingChoice {
                title,
                candidates,
                remaining,
            }
        }
        BatchStep::Finalized(set) if set.is_empty() => {
            sessions::clear_batch(&state.db, session_id).await?;
            notices.push(Notice::info("No new movies to add."));
            StepView::Idle
        }
        BatchStep::Finalized(set) => {
            let entries = set.entries().to_vec();
            sessions::save_batch(&state.db, session_id, &BatchSession::Confirming(set)).await?;
            StepView::Confirming { entries }
        }
    };

    Ok(StepResponse { step, notices })
}

/// Start a new batch, replacing any batch already in progress
async fn start_batch(
    state: &AppState,
    session_id: Uuid,
    titles: Vec<String>,
) -> ApiResult<StepResponse> {
    sessions::clear_batch(&state.db, session_id).await?;

    let titles: Vec<String> = titles.iter().map(|title| fold_quotes(title)).collect();
    if titles.iter().all(|title| normalize_title(title).is_empty()) {
        return Ok(StepResponse::idle(vec![Notice::warning(
            "No usable movie titles were given.",
        )]));
    }

    let catalog_titles: Vec<String> = state
        .catalog
        .load_all()
        .await?
        .into_iter()
        .map(|record| record.title)
        .collect();

    let batch = BatchState::from_titles(titles, &catalog_titles);
    if batch.queue.is_empty() {
        return Ok(StepResponse::idle(vec![Notice::info(
            "All titles are already in the database.",
        )]));
    }

    info!(count = batch.queue.len(), "Batch started");
    run_batch(state, session_id, batch, None).await
}

/// POST /batch/image
///
/// Body is the raw image.
pub async fn batch_from_image(
    State(state): State<AppState>,
    LoggedIn(session_id): LoggedIn,
    image: Bytes,
) -> ApiResult<Json<StepResponse>> {
    if image.is_empty() {
        return Err(ApiError::BadRequest("No image uploaded".to_string()));
    }

    let titles = state.extractor.extract_titles(&image).await;
    if titles.is_empty() {
        return Ok(Json(StepResponse::idle(vec![Notice::warning(
            "No movie titles detected in the image.",
        )])));
    }

    debug!(titles = ?titles, "Titles extracted from image");
    Ok(Json(start_batch(&state, session_id, titles).await?))
}

#[derive(Debug, Deserialize)]
pub struct TitlesRequest {
    pub titles: Vec<String>,
}

/// POST /batch/titles
pub async fn batch_from_titles(
    State(state): State<AppState>,
    LoggedIn(session_id): LoggedIn,
    Json(request): Json<TitlesRequest>,
) -> ApiResult<Json<StepResponse>> {
    if request.titles.iter().all(|title| title.trim().is_empty()) {
        return Err(ApiError::BadRequest("Please enter at least one movie title.".to_string()));
    }
    Ok(Json(start_batch(&state, session_id, request.titles).await?))
}

#[derive(Debug, Deserialize)]
pub struct AddByTitleRequest {
    pub title: String,
}

/// POST /movies/add-by-title
pub async fn add_by_title(
    State(state): State<AppState>,
    LoggedIn(session_id): LoggedIn,
    Json(request): Json<AddByTitleRequest>,
) -> ApiResult<Json<StepResponse>> {
    let title = fold_quotes(request.title.trim());
    if title.is_empty() {
        return Err(ApiError::BadRequest("Please enter a movie title.".to_string()));
    }

    if state.catalog.find_by_title(&title).await?.is_some() {
        sessions::clear_batch(&state.db, session_id).await?;
        return Ok(Json(StepResponse::idle(vec![Notice::info(format!(
            "'{}' is already in the database.",
            title
        ))])));
    }

    Ok(Json(start_batch(&state, session_id, vec![title]).await?))
}

/// GET /batch
pub async fn current_step(
    State(state): State<AppState>,
    LoggedIn(session_id): LoggedIn,
) -> ApiResult<Json<StepResponse>> {
    let response = match sessions::load_batch(&state.db, session_id).await? {
        None => StepResponse::idle(Vec::new()),
        Some(BatchSession::Draining(batch)) => run_batch(&state, session_id, batch, None).await?,
        Some(BatchSession::Confirming(set)) => StepResponse {
            step: StepView::Confirming {
                entries: set.entries().to_vec(),
            },
            notices: Vec::new(),
        },
    };
    Ok(Json(response))
}

#[derive(Debug, Deserialize)]
pub struct DecisionRequest {
    pub action: String,
    #[serde(default)]
    pub selected_movie_id: Option<String>,
}

impl DecisionRequest {
    fn into_input(self) -> ApiResult<UserInput> {
        match self.action.as_str() {
            "reject" => Ok(UserInput::Reject),
            "select" => Ok(self
                .selected_movie_id
                .map(|id| id.trim().to_string())
                .filter(|id| !id.is_empty())
                .map(|id| UserInput::Select(MovieId::new(id)))
                .unwrap_or(UserInput::NoSelection)),
            other => Err(ApiError::BadRequest(format!("Unknown action '{}'", other))),
        }
    }
}

/// POST /batch/decision
pub async fn decide(
    State(state): State<AppState>,
    LoggedIn(session_id): LoggedIn,
    Json(request): Json<DecisionRequest>,
) -> ApiResult<Json<StepResponse>> {
    let input = request.into_input()?;

    match sessions::load_batch(&state.db, session_id).await? {
        Some(BatchSession::Draining(batch)) => {
            Ok(Json(run_batch(&state, session_id, batch, Some(input)).await?))
        }
        Some(BatchSession::Confirming(_)) => Err(ApiError::Conflict(
            "The batch is waiting for final confirmation".to_string(),
        )),
        None => Err(ApiError::Conflict("No batch in progress".to_string())),
    }
}

/// GET /batch/confirm
pub async fn pending_confirmation(
    State(state): State<AppState>,
    LoggedIn(session_id): LoggedIn,
) -> ApiResult<Json<Vec<ConfirmationEntry>>> {
    match sessions::load_batch(&state.db, session_id).await? {
        Some(BatchSession::Confirming(set)) => Ok(Json(set.entries().to_vec())),
        _ => Err(ApiError::Conflict("No batch awaiting confirmation".to_string())),
    }
}

#[derive(Debug, Serialize)]
pub struct CommitResponse {
    pub inserted: usize,
    pub skipped: usize,
    pub notice: Notice,
}

/// POST /batch/confirm
pub async fn confirm_batch(
    State(state): State<AppState>,
    LoggedIn(session_id): LoggedIn,
) -> ApiResult<Json<CommitResponse>> {
    let Some(BatchSession::Confirming(set)) = sessions::load_batch(&state.db, session_id).await?
    else {
        return Err(ApiError::Conflict("No batch awaiting confirmation".to_string()));
    };

    let report = workflow::commit(&set, state.controller.fetcher(), &state.catalog).await?;
    sessions::clear_batch(&state.db, session_id).await?;

    let notice = if report.inserted > 0 {
        Notice::success(format!("Added {} movie(s) to the database.", report.inserted))
    } else {
        Notice::info("No new movies were added.")
    };

    Ok(Json(CommitResponse {
        inserted: report.inserted,
        skipped: report.skipped,
        notice,
    }))
}

/// POST /batch/cancel
pub async fn cancel_batch(
    State(state): State<AppState>,
    LoggedIn(session_id): LoggedIn,
) -> ApiResult<Json<StepResponse>> {
    sessions::clear_batch(&state.db, session_id).await?;
    info!(session_id = %session_id, "Batch cancelled");
    Ok(Json(StepResponse::idle(Vec::new())))
}

pub fn batch_routes() -> Router<AppState> {
    Router::new()
        .route("/batch", get(current_step))
        .route("/batch/image", post(batch_from_image))
        .route("/batch/titles", post(batch_from_titles))
        .route("/batch/decision", post(decide))
        .route("/batch/confirm", get(pending_confirmation).post(confirm_batch))
        .route("/batch/cancel", post(cancel_batch))
        .route("/movies/add-by-title", post(add_by_title))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(action: &str, id: Option<&str>) -> DecisionRequest {
        DecisionRequest {
            action: action.to_string(),
            selected_movie_id: id.map(str::to_string),
        }
    }

    #[test]
    fn test_decision_mapping() {
        assert_eq!(request("reject", None).into_input().unwrap(), UserInput::Reject);
        assert_eq!(
            request("select", Some("603")).into_input().unwrap(),
            UserInput::Select(MovieId::new("603"))
        );
        assert_eq!(
            request("select", Some("  ")).into_input().unwrap(),
            UserInput::NoSelection
        );
        assert_eq!(request("select", None).into_input().unwrap(), UserInput::NoSelection);
        assert!(request("skip", None).into_input().is_err());
    }

    #[test]
    fn test_step_view_is_tagged_by_status() {
        let response = StepResponse::idle(vec![Notice::info("hello")]);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "idle");
        assert_eq!(json["notices"][0]["level"], "info");
    }
}
