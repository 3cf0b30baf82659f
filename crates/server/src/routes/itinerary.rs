use axum::{extract::State, Extension, Json};
use serde_json::{json, Value};
use service::itinerary::{GenerateRequest, GeneratedItinerary, SaveItineraryRequest};

use crate::auth::{AuthUser, ServerState};
use crate::errors::JsonApiError;

#[utoipa::path(
    post,
    path = "/api/itinerary/generate",
    request_body = crate::openapi::GenerateRequestDoc,
    responses(
        (status = 200, description = "Day-by-day plan with cost summary"),
        (status = 400, description = "Invalid duration selected")
    ),
    tag = "itinerary"
)]
pub async fn generate(
    State(state): State<ServerState>,
    Extension(_user): Extension<AuthUser>,
    Json(input): Json<GenerateRequest>,
) -> Result<Json<GeneratedItinerary>, JsonApiError> {
    Ok(Json(state.itinerary.generate(input).await?))
}

#[utoipa::path(
    post,
    path = "/api/itinerary/save",
    request_body = crate::openapi::SaveItineraryRequestDoc,
    responses(
        (status = 200, description = "Itinerary saved"),
        (status = 404, description = "User not found")
    ),
    tag = "itinerary"
)]
pub async fn save(
    State(state): State<ServerState>,
    Extension(user): Extension<AuthUser>,
    Json(input): Json<SaveItineraryRequest>,
) -> Result<Json<Value>, JsonApiError> {
    let record = state.itinerary.save(&user.user_id, input).await?;
    Ok(Json(json!({ "message": "Itinerary saved", "itinerary": record })))
}

#[utoipa::path(
    get,
    path = "/api/itinerary",
    responses(
        (status = 200, description = "Saved itineraries"),
        (status = 404, description = "User not found")
    ),
    tag = "itinerary"
)]
pub async fn list(State(state): State<ServerState>, Extension(user): Extension<AuthUser>) -> Result<Json<Value>, JsonApiError> {
    let itineraries = state.itinerary.list(&user.user_id).await?;
    Ok(Json(json!({ "itineraries": itineraries })))
}
