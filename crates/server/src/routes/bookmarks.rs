use axum::{extract::State, Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::{AuthUser, ServerState};
use crate::errors::JsonApiError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkRequest {
    #[serde(default)]
    pub place_name: String,
}

#[utoipa::path(
    get,
    path = "/api/bookmarks",
    responses(
        (status = 200, description = "Bookmarked place names", body = crate::openapi::BookmarksResponse),
        (status = 404, description = "User not found")
    ),
    tag = "bookmarks"
)]
pub async fn list(State(state): State<ServerState>, Extension(user): Extension<AuthUser>) -> Result<Json<Value>, JsonApiError> {
    let bookmarks = state.bookmarks.list(&user.user_id).await?;
    Ok(Json(json!({ "bookmarks": bookmarks })))
}

#[utoipa::path(
    post,
    path = "/api/bookmarks/add",
    request_body = crate::openapi::BookmarkRequestDoc,
    responses(
        (status = 200, description = "Bookmark added", body = crate::openapi::BookmarksResponse),
        (status = 400, description = "Already bookmarked"),
        (status = 404, description = "User not found")
    ),
    tag = "bookmarks"
)]
pub async fn add(
    State(state): State<ServerState>,
    Extension(user): Extension<AuthUser>,
    Json(input): Json<BookmarkRequest>,
) -> Result<Json<Value>, JsonApiError> {
    let bookmarks = state.bookmarks.add(&user.user_id, &input.place_name).await?;
    Ok(Json(json!({ "message": "Bookmark added", "bookmarks": bookmarks })))
}

#[utoipa::path(
    post,
    path = "/api/bookmarks/remove",
    request_body = crate::openapi::BookmarkRequestDoc,
    responses(
        (status = 200, description = "Bookmark removed", body = crate::openapi::BookmarksResponse),
        (status = 404, description = "User not found")
    ),
    tag = "bookmarks"
)]
pub async fn remove(
    State(state): State<ServerState>,
    Extension(user): Extension<AuthUser>,
    Json(input): Json<BookmarkRequest>,
) -> Result<Json<Value>, JsonApiError> {
    let bookmarks = state.bookmarks.remove(&user.user_id, &input.place_name).await?;
    Ok(Json(json!({ "message": "Bookmark removed", "bookmarks": bookmarks })))
}
