//! Plaid proxy is a small HTTP server that sits between the Second Brain
//! Obsidian plugin and the Plaid financial-data API.
//!
//! It exposes simplified JSON endpoints for bank-account linking, token
//! exchange, and transaction retrieval, and keeps a local SQLite store of
//! ingested transaction batches so downstream consumers can page through
//! transactions and report processing progress.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use time::Date;
use tokio::signal;

mod app_state;
mod batch;
mod db;
mod endpoints;
mod link;
mod logging;
mod pagination;
mod plaid;
mod routing;
#[cfg(test)]
mod test_stub;

pub use app_state::AppState;
pub use batch::MarkPolicy;
pub use db::initialize as initialize_db;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use pagination::PaginationConfig;
pub use plaid::{PlaidApi, PlaidClient, ProviderConfig};
pub use routing::build_router;

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The start of a requested date range was after its end.
    #[error("invalid date range: start date {0} is after end date {1}")]
    InvalidDateRange(Date, Date),

    /// A request was made with an empty Plaid access token.
    #[error("access token must not be empty")]
    EmptyAccessToken,

    /// Neither the request nor the server environment provided Plaid
    /// credentials.
    #[error("Plaid credentials not configured in environment or request")]
    MissingCredentials,

    /// The Plaid API rejected a request or could not be reached.
    ///
    /// The message includes the upstream `error_type`/`error_code` when the
    /// provider returned a structured error payload.
    #[error("{0}")]
    Provider(String),

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the batch ID
    /// is correct and that the batch has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// A single provider record could not be converted for storage.
    ///
    /// During ingestion these are logged and the record is skipped, so this
    /// error never aborts a batch.
    #[error("could not convert transaction record: {0}")]
    Conversion(String),

    /// A mark-processed call named transaction IDs outside the batch while
    /// the strict [MarkPolicy] was active.
    #[error("transaction IDs do not belong to the batch: {0:?}")]
    UnknownTransactionIds(Vec<String>),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLock,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Error::InvalidDateRange(_, _)
            | Error::EmptyAccessToken
            | Error::MissingCredentials
            | Error::UnknownTransactionIds(_)
            | Error::Provider(_) => StatusCode::BAD_REQUEST,
            Error::NotFound => StatusCode::NOT_FOUND,
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        // The same error body shape as the FastAPI service this replaces.
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}
