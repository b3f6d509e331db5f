//! Login sessions
//!
//! A successful login creates a session row and hands its id back in an
//! HttpOnly cookie. Handlers that need a logged-in user take the `LoggedIn`
//! extractor, which rejects the request with 401 before the handler runs.

use axum::{
    async_trait,
    extract::{FromRequestParts, State},
    http::{
        header::{COOKIE, SET_COOKIE},
        request::Parts,
        HeaderMap,
    },
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::sessions;
use crate::{ApiError, ApiResult, AppState};

pub const SESSION_COOKIE: &str = "cinelog_session";

/// Proof that the request carries a live login session
#[derive(Debug, Clone, Copy)]
pub struct LoggedIn(pub Uuid);

#[async_trait]
impl FromRequestParts<AppState> for LoggedIn {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let session_id = session_cookie(&parts.headers)
            .ok_or_else(|| ApiError::Unauthorized("Please log in".to_string()))?;

        if !sessions::session_exists(&state.db, session_id).await? {
            return Err(ApiError::Unauthorized("Session expired, please log in again".to_string()));
        }

        Ok(LoggedIn(session_id))
    }
}

/// Session id from the Cookie header, if present and well-formed
pub fn session_cookie(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub password: String,
}

/// POST /login
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    if request.password != *state.site_password {
        warn!("Login rejected: incorrect password");
        return Err(ApiError::Unauthorized("Incorrect password.".to_string()));
    }

    let session_id = sessions::create_session(&state.db).await?;
    let cookie = format!(
        "{}={}; HttpOnly; Path=/; SameSite=Lax",
        SESSION_COOKIE, session_id
    );

    Ok(([(SET_COOKIE, cookie)], Json(json!({ "logged_in": true }))))
}

/// POST /logout
///
/// Deleting the session also discards any batch or search in progress.
pub async fn logout(
    State(state): State<AppState>,
    LoggedIn(session_id): LoggedIn,
) -> ApiResult<impl IntoResponse> {
    sessions::delete_session(&state.db, session_id).await?;
    info!(session_id = %session_id, "Logged out");

    let cookie = format!("{}=; HttpOnly; Path=/; Max-Age=0", SESSION_COOKIE);
    Ok(([(SET_COOKIE, cookie)], Json(json!({ "logged_in": false }))))
}

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
}
