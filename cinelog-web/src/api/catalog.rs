//! Catalog browsing and maintenance endpoints

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    routing::{delete, get, post, put},
    Json, Router,
};
use cinelog_common::titles::fold_quotes;
use cinelog_common::{MovieId, MovieRecord};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::{debug, info};

use super::auth::LoggedIn;
use crate::db::sessions;
use crate::models::Notice;
use crate::services::RecordEdit;
use crate::{ApiError, ApiResult, AppState};

/// Runtimes within this many minutes of the target match a search
const RUNTIME_TOLERANCE: f64 = 10.0;

#[derive(Debug, Default, Deserialize)]
pub struct SortParams {
    #[serde(default)]
    pub sort: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MoviesResponse {
    pub movies: Vec<MovieRecord>,
    pub count: usize,
    /// True when `movies` are stored search results rather than the catalog
    pub searched: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
}

/// Column to sort the movie list by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Title,
    Year,
    Runtime,
    Actors,
    Notes,
}

impl SortKey {
    /// Unknown keys mean file order
    pub fn parse(key: &str) -> Option<Self> {
        match key.to_ascii_lowercase().as_str() {
            "title" => Some(SortKey::Title),
            "year" => Some(SortKey::Year),
            "runtime" => Some(SortKey::Runtime),
            "actors" => Some(SortKey::Actors),
            "notes" => Some(SortKey::Notes),
            _ => None,
        }
    }

    fn compare(self, a: &MovieRecord, b: &MovieRecord) -> Ordering {
        match self {
            SortKey::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
            SortKey::Year => year_number(a).cmp(&year_number(b)),
            SortKey::Runtime => a.runtime.unwrap_or(0).cmp(&b.runtime.unwrap_or(0)),
            SortKey::Actors => a.actors.to_lowercase().cmp(&b.actors.to_lowercase()),
            SortKey::Notes => a.notes.to_lowercase().cmp(&b.notes.to_lowercase()),
        }
    }
}

fn year_number(record: &MovieRecord) -> u32 {
    record.year.trim().parse().unwrap_or(0)
}

/// Stable sort; `None` keeps the order as stored
pub fn sort_records(records: &mut [MovieRecord], key: Option<SortKey>) {
    if let Some(key) = key {
        records.sort_by(|a, b| key.compare(a, b));
    }
}

/// Field filters for a catalog search; blank fields are ignored
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchCriteria {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub year: Option<String>,
    #[serde(default)]
    pub runtime: Option<String>,
    #[serde(default)]
    pub actors: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl SearchCriteria {
    pub fn matches(&self, record: &MovieRecord) -> bool {
        contains_ci(&record.title, self.title.as_deref())
            && contains_ci(&record.year, self.year.as_deref())
            && contains_ci(&record.actors, self.actors.as_deref())
            && contains_ci(&record.notes, self.notes.as_deref())
            && runtime_matches(record.runtime, self.runtime.as_deref())
    }
}

fn active(filter: Option<&str>) -> Option<&str> {
    filter.map(str::trim).filter(|f| !f.is_empty())
}

fn contains_ci(value: &str, filter: Option<&str>) -> bool {
    match active(filter) {
        Some(filter) => value.to_lowercase().contains(&filter.to_lowercase()),
        None => true,
    }
}

/// Records without a runtime pass; a target that is not a number matches nothing
fn runtime_matches(runtime: Option<u32>, filter: Option<&str>) -> bool {
    let Some(filter) = active(filter) else {
        return true;
    };
    let Ok(target) = filter.parse::<f64>() else {
        return false;
    };
    match runtime {
        Some(runtime) => (f64::from(runtime) - target).abs() <= RUNTIME_TOLERANCE,
        None => true,
    }
}

/// GET /movies
pub async fn list_movies(
    State(state): State<AppState>,
    LoggedIn(session_id): LoggedIn,
    Query(params): Query<SortParams>,
) -> ApiResult<Json<MoviesResponse>> {
    let (mut movies, searched) = match sessions::load_search(&state.db, session_id).await? {
        Some(results) => (results, true),
        None => (state.catalog.load_all().await?, false),
    };

    sort_records(&mut movies, params.sort.as_deref().and_then(SortKey::parse));
    debug!(count = movies.len(), searched, "Listing movies");

    Ok(Json(MoviesResponse {
        count: movies.len(),
        movies,
        searched,
        sort: params.sort,
    }))
}

/// POST /movies/search
pub async fn search_movies(
    State(state): State<AppState>,
    LoggedIn(session_id): LoggedIn,
    Json(criteria): Json<SearchCriteria>,
) -> ApiResult<Json<MoviesResponse>> {
    let movies: Vec<MovieRecord> = state
        .catalog
        .load_all()
        .await?
        .into_iter()
        .filter(|record| criteria.matches(record))
        .collect();

    sessions::save_search(&state.db, session_id, &movies).await?;
    info!(count = movies.len(), "Catalog search");

    Ok(Json(MoviesResponse {
        count: movies.len(),
        movies,
        searched: true,
        sort: None,
    }))
}

/// POST /movies/search/clear
pub async fn clear_search(
    State(state): State<AppState>,
    LoggedIn(session_id): LoggedIn,
) -> ApiResult<Json<serde_json::Value>> {
    sessions::clear_search(&state.db, session_id).await?;
    Ok(Json(serde_json::json!({ "searched": false })))
}

/// Body of an edit; absent fields keep their value
#[derive(Debug, Default, Deserialize)]
pub struct EditRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub year: Option<String>,
    /// Minutes as text; empty clears the runtime
    #[serde(default)]
    pub runtime: Option<String>,
    #[serde(default)]
    pub actors: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl EditRequest {
    fn into_edit(self) -> ApiResult<RecordEdit> {
        let runtime = match self.runtime.as_deref().map(str::trim) {
            None => None,
            Some("") => Some(None),
            Some(minutes) => Some(Some(minutes.parse::<u32>().map_err(|_| {
                ApiError::BadRequest(format!("Runtime must be a number of minutes, got '{}'", minutes))
            })?)),
        };

        Ok(RecordEdit {
            title: self.title,
            year: self.year,
            runtime,
            actors: self.actors,
            notes: self.notes,
        })
    }
}

/// PUT /movies/by-title/:title
pub async fn edit_movie(
    State(state): State<AppState>,
    _logged_in: LoggedIn,
    Path(title): Path<String>,
    Json(request): Json<EditRequest>,
) -> ApiResult<Json<MovieRecord>> {
    let edit = request.into_edit()?;

    match state.catalog.edit_by_title(&title, edit).await? {
        Some(record) => {
            info!(title = %title, "Movie edited");
            Ok(Json(record))
        }
        None => Err(ApiError::NotFound(format!("No movie titled '{}'", title))),
    }
}

/// DELETE /movies/:id
pub async fn delete_movie(
    State(state): State<AppState>,
    _logged_in: LoggedIn,
    Path(id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let removed = state.catalog.delete_by_id(&MovieId::new(id.clone())).await?;
    if removed == 0 {
        return Err(ApiError::NotFound(format!("No movie with id {}", id)));
    }

    info!(id = %id, removed, "Movie deleted");
    Ok(Json(serde_json::json!({ "removed": removed })))
}

#[derive(Debug, Deserialize)]
pub struct ConfirmAddRequest {
    pub selected_movie_id: String,
}

#[derive(Debug, Serialize)]
pub struct ConfirmAddResponse {
    pub added: bool,
    pub notice: Notice,
}

/// POST /movies/confirm-add
pub async fn confirm_add(
    State(state): State<AppState>,
    _logged_in: LoggedIn,
    Json(request): Json<ConfirmAddRequest>,
) -> ApiResult<Json<ConfirmAddResponse>> {
    let id = MovieId::new(request.selected_movie_id.trim());
    if id.as_str().is_empty() {
        return Err(ApiError::BadRequest("Please select a movie to add.".to_string()));
    }

    let record = state
        .controller
        .fetcher()
        .fetch_details(&id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Could not retrieve details for movie {}.", id)))?;

    let title = record.title.clone();
    let added = state.catalog.insert_if_absent(vec![record]).await? > 0;
    let notice = if added {
        Notice::success(format!("'{}' added to the database.", title))
    } else {
        Notice::info(format!("'{}' is already in the database.", title))
    };

    Ok(Json(ConfirmAddResponse { added, notice }))
}

#[derive(Debug, Serialize)]
pub struct ImageSearchResponse {
    pub movies: Vec<MovieRecord>,
    pub notices: Vec<Notice>,
}

/// POST /movies/search-by-image
///
/// Body is the raw image. Returns the catalog records whose title equals
/// one of the titles read from the image.
pub async fn search_by_image(
    State(state): State<AppState>,
    _logged_in: LoggedIn,
    image: Bytes,
) -> ApiResult<Json<ImageSearchResponse>> {
    if image.is_empty() {
        return Err(ApiError::BadRequest("No image uploaded".to_string()));
    }

    let titles: Vec<String> = state
        .extractor
        .extract_titles(&image)
        .await
        .iter()
        .map(|title| fold_quotes(title))
        .collect();

    let mut notices = Vec::new();
    if titles.is_empty() {
        notices.push(Notice::warning("No movie titles detected in the image."));
    }

    let catalog = state.catalog.load_all().await?;
    let mut movies = Vec::new();
    for title in &titles {
        let found: Vec<&MovieRecord> = catalog.iter().filter(|r| r.has_title(title)).collect();
        if found.is_empty() {
            notices.push(Notice::info(format!("'{}' is not in the database.", title)));
        }
        movies.extend(found.into_iter().cloned());
    }

    Ok(Json(ImageSearchResponse { movies, notices }))
}

pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/movies", get(list_movies))
        .route("/movies/search", post(search_movies))
        .route("/movies/search/clear", post(clear_search))
        .route("/movies/search-by-image", post(search_by_image))
        .route("/movies/confirm-add", post(confirm_add))
        .route("/movies/by-title/:title", put(edit_movie))
        .route("/movies/:id", delete(delete_movie))
}
