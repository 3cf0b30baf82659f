use axum::{
    middleware,
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use common::types::Health;

use crate::auth::{self, ServerState};
use crate::openapi::ApiDoc;

pub mod bookmarks;
pub mod catalog;
pub mod itinerary;

#[utoipa::path(
    get,
    path = "/api/health",
    responses((status = 200, description = "API is running", body = crate::openapi::HealthResponse)),
    tag = "health"
)]
pub async fn health() -> Json<Health> {
    Json(Health::ok("TamilNadu Heritage Explorer API is running"))
}

/// Build the full application router: public catalog routes, token-protected
/// user routes, and the API docs.
pub fn build_router(state: ServerState, cors: CorsLayer) -> Router {
    let public = Router::new()
        .route("/api/health", get(health))
        .route("/api/heritage", get(catalog::heritage))
        .route("/api/crafts", get(catalog::crafts))
        .route("/api/marketplace", get(catalog::marketplace))
        .route("/api/lang", get(catalog::lang));

    let protected = Router::new()
        .route("/api/bookmarks", get(bookmarks::list))
        .route("/api/bookmarks/add", post(bookmarks::add))
        .route("/api/bookmarks/remove", post(bookmarks::remove))
        .route("/api/itinerary", get(itinerary::list))
        .route("/api/itinerary/generate", post(itinerary::generate))
        .route("/api/itinerary/save", post(itinerary::save))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::require_bearer_token));

    public
        .merge(protected)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
