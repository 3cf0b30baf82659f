use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use service::{bookmarks::BookmarkService, catalog::CatalogService, itinerary::ItineraryService, storage::DocumentId};

use crate::errors::JsonApiError;

#[derive(Clone)]
pub struct ServerAuthConfig {
    pub jwt_secret: String,
}

#[derive(Clone)]
pub struct ServerState {
    pub auth: ServerAuthConfig,
    pub catalog: Arc<CatalogService>,
    pub bookmarks: Arc<BookmarkService>,
    pub itinerary: Arc<ItineraryService>,
}

/// Token claims issued by the account service.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "userId")]
    pub user_id: DocumentId,
    pub exp: usize,
}

/// Authenticated caller, inserted into request extensions by [`require_bearer_token`].
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: DocumentId,
}

fn bearer_token(req: &Request) -> Option<&str> {
    req.headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Verify the HS256 bearer token: 401 when absent, 403 when invalid or expired.
pub async fn require_bearer_token(State(state): State<ServerState>, mut req: Request, next: Next) -> Response {
    let path = req.uri().path().to_string();
    let Some(token) = bearer_token(&req) else {
        tracing::warn!(path = %path, "missing bearer token");
        return JsonApiError::new(StatusCode::UNAUTHORIZED, "Access token required").into_response();
    };

    let key = DecodingKey::from_secret(state.auth.jwt_secret.as_bytes());
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;

    match decode::<Claims>(token, &key, &validation) {
        Ok(data) => {
            req.extensions_mut().insert(AuthUser { user_id: data.claims.user_id });
            next.run(req).await
        }
        Err(e) => {
            tracing::warn!(path = %path, err = %e, "token validation failed");
            JsonApiError::new(StatusCode::FORBIDDEN, "Invalid or expired token").into_response()
        }
    }
}
