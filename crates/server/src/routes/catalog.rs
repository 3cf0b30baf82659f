use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use utoipa::IntoParams;
use service::{catalog::CatalogKind, storage::Document};

use crate::auth::ServerState;
use crate::errors::JsonApiError;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CategoryFilter {
    /// Only documents whose `category` equals this value
    pub category: Option<String>,
}

async fn list(state: &ServerState, kind: CatalogKind, filter: CategoryFilter) -> Result<Json<Vec<Document>>, JsonApiError> {
    let docs = state.catalog.list(kind, filter.category.as_deref()).await?;
    Ok(Json(docs))
}

#[utoipa::path(
    get,
    path = "/api/heritage",
    params(CategoryFilter),
    responses((status = 200, description = "Heritage sites"), (status = 500, description = "Storage failure")),
    tag = "catalog"
)]
pub async fn heritage(State(state): State<ServerState>, Query(filter): Query<CategoryFilter>) -> Result<Json<Vec<Document>>, JsonApiError> {
    list(&state, CatalogKind::Heritage, filter).await
}

#[utoipa::path(
    get,
    path = "/api/crafts",
    params(CategoryFilter),
    responses((status = 200, description = "Crafts"), (status = 500, description = "Storage failure")),
    tag = "catalog"
)]
pub async fn crafts(State(state): State<ServerState>, Query(filter): Query<CategoryFilter>) -> Result<Json<Vec<Document>>, JsonApiError> {
    list(&state, CatalogKind::Crafts, filter).await
}

#[utoipa::path(
    get,
    path = "/api/marketplace",
    params(CategoryFilter),
    responses((status = 200, description = "Marketplace items"), (status = 500, description = "Storage failure")),
    tag = "catalog"
)]
pub async fn marketplace(State(state): State<ServerState>, Query(filter): Query<CategoryFilter>) -> Result<Json<Vec<Document>>, JsonApiError> {
    list(&state, CatalogKind::Marketplace, filter).await
}

#[utoipa::path(
    get,
    path = "/api/lang",
    responses((status = 200, description = "Translations keyed by language")),
    tag = "catalog"
)]
pub async fn lang(State(state): State<ServerState>) -> Result<Json<Value>, JsonApiError> {
    Ok(Json(state.catalog.lang().await?))
}
