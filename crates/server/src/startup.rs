use std::{net::SocketAddr, sync::Arc};

use axum::{
    http::{header, HeaderValue, Method},
    Router,
};
use configs::AppConfig;
use dotenvy::dotenv;
use service::{
    bookmarks::BookmarkService,
    bootstrap::{select_backend, StoreAvailability},
    catalog::CatalogService,
    itinerary::ItineraryService,
    runtime,
    storage::Backend,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{info, warn};

use crate::auth::{ServerAuthConfig, ServerState};
use crate::errors::StartupError;
use crate::routes;

/// Services and auth settings shared by every handler.
pub fn build_state(cfg: &AppConfig, backend: &Backend) -> ServerState {
    ServerState {
        auth: ServerAuthConfig { jwt_secret: cfg.auth.jwt_secret.clone() },
        catalog: Arc::new(CatalogService::new(backend, cfg.storage.data_dir.clone())),
        bookmarks: Arc::new(BookmarkService::new(backend)),
        itinerary: Arc::new(ItineraryService::new(backend)),
    }
}

/// CORS restricted to `origins`, with credentials. Unparsable origins are skipped.
pub fn build_cors(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %o, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

fn bind_addr(cfg: &AppConfig) -> anyhow::Result<SocketAddr> {
    Ok(format!("{}:{}", cfg.server.host, cfg.server.port).parse()?)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    info!("received Ctrl+C, shutting down");
}

/// Public entry: load configuration, select storage, build the app and serve until Ctrl+C.
pub async fn run() -> anyhow::Result<()> {
    dotenv().ok();

    let cfg = AppConfig::load_and_validate().map_err(|e| StartupError::InvalidConfig(e.to_string()))?;
    runtime::ensure_env(&cfg.storage.data_dir)
        .await
        .map_err(|e| StartupError::Runtime(e.to_string()))?;

    let selection = select_backend(&cfg.firestore, &cfg.storage.data_dir);
    if let StoreAvailability::Unavailable { reason } = &selection.availability {
        info!(%reason, data_dir = %cfg.storage.data_dir.display(), "serving collections from JSON files");
    }

    let state = build_state(&cfg, &selection.backend);
    let cors = build_cors(&cfg.cors.origins());
    let app: Router = routes::build_router(state, cors);

    let addr = bind_addr(&cfg)?;
    info!(%addr, backend = selection.backend.name(), "starting heritage api");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    Ok(())
}
