//! Route configuration and setup.

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::Method,
    routing::{get, post},
    Json, Router,
};
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use refstash_core::Config;

use crate::api_doc;
use crate::constants;
use crate::handlers;
use crate::state::AppState;

/// Loopback service for one user; a small cap keeps a misbehaving extension
/// from piling up concurrent saves.
const HTTP_CONCURRENCY_LIMIT: usize = 128;

/// Setup all application routes
pub async fn setup_routes(
    config: &Config,
    state: Arc<AppState>,
) -> Result<Router, anyhow::Error> {
    let connector_routes = Router::new()
        .route("/saveItems", post(handlers::save_items::save_items))
        .route(
            "/saveSnapshot",
            post(handlers::save_snapshot::save_snapshot),
        )
        .route("/savePage", post(handlers::save_page::save_page))
        .route("/import", post(handlers::import::import))
        .route(
            "/updateSession",
            post(handlers::update_session::update_session),
        )
        .route(
            "/getTranslatorCode",
            post(handlers::translator_code::get_translator_code),
        )
        .route("/detect", post(handlers::detect::detect))
        .with_state(state);

    let app = Router::new()
        .nest(constants::API_PREFIX, connector_routes)
        .route("/health", get(health_check))
        .route(
            "/api/openapi.json",
            get(|| async { Json(api_doc::get_openapi_spec()) }),
        )
        .merge(utoipa_rapidoc::RapiDoc::new("/api/openapi.json").path("/docs"))
        .layer(ConcurrencyLimitLayer::new(HTTP_CONCURRENCY_LIMIT))
        .layer(RequestBodyLimitLayer::new(config.max_body_bytes))
        .layer(DefaultBodyLimit::disable())
        .layer(setup_cors())
        .layer(TraceLayer::new_for_http());

    Ok(app)
}

/// The extension calls from arbitrary page origins, so the loopback-bound
/// service answers any origin.
fn setup_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
