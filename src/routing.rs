//! Application router configuration and the small service endpoints.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::json;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tower_http::cors::CorsLayer;

use crate::{
    AppState,
    batch::{
        batch_status_endpoint, batch_transactions_endpoint, create_batch_endpoint,
        list_batches_endpoint, mark_processed_endpoint,
    },
    endpoints,
    link::{
        create_link_token_endpoint, exchange_public_token_endpoint, fetch_transactions_endpoint,
        get_accounts_endpoint, get_link_page,
    },
    logging::logging_middleware,
    plaid::ProviderConfig,
};

/// Return a router with all the proxy's routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(endpoints::ROOT, get(get_service_banner))
        .route(endpoints::HEALTH, get(get_health))
        .route(endpoints::TEST, get(get_test))
        .route(endpoints::LINK_TOKEN, post(create_link_token_endpoint))
        .route(
            endpoints::EXCHANGE_TOKEN,
            post(exchange_public_token_endpoint),
        )
        .route(endpoints::ACCOUNTS, post(get_accounts_endpoint))
        .route(endpoints::TRANSACTIONS, post(fetch_transactions_endpoint))
        .route(endpoints::LINK_VIEW, get(get_link_page))
        .route(endpoints::CREATE_BATCH, post(create_batch_endpoint))
        .route(endpoints::BATCH_STATUS, get(batch_status_endpoint))
        .route(
            endpoints::BATCH_TRANSACTIONS,
            get(batch_transactions_endpoint),
        )
        .route(endpoints::MARK_PROCESSED, post(mark_processed_endpoint))
        .route(endpoints::LIST_BATCHES, get(list_batches_endpoint))
        .fallback(get_not_found)
        .layer(middleware::from_fn(logging_middleware))
        .layer(cors_layer())
        .with_state(state)
}

/// Permissive CORS so the Obsidian desktop app, which calls the proxy from
/// an `app://obsidian.md` origin, is not blocked by its embedded browser.
fn cors_layer() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// The service banner, kept to the same shape as the service this replaces.
async fn get_service_banner(State(config): State<ProviderConfig>) -> Json<serde_json::Value> {
    Json(json!({
        "service": "Second Brain Plaid Proxy",
        "status": "running",
        "version": env!("CARGO_PKG_VERSION"),
        "plaid_env": config.environment.as_str(),
    }))
}

/// The liveness check.
async fn get_health() -> Json<serde_json::Value> {
    let timestamp = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default();

    Json(json!({ "status": "healthy", "timestamp": timestamp }))
}

/// Reports whether the server-side Plaid credentials are configured, for
/// checking a deployment without real credentials in hand.
async fn get_test(State(config): State<ProviderConfig>) -> Json<serde_json::Value> {
    Json(json!({
        "message": "Plaid proxy server is running!",
        "plaid_configured": config.is_configured(),
        "environment": config.environment.as_str(),
    }))
}

/// Unknown routes get the same JSON body shape as the API errors.
async fn get_not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "detail": "Not Found" }))).into_response()
}
