//! Defines the endpoint for creating a new transaction batch.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    http::StatusCode,
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    AppState, Error,
    plaid::{PlaidApi, PlaidCredentials, ProviderConfig},
};

use super::core::BatchStatus;
use super::ingest::ingest_batch;

/// The state needed to create a transaction batch.
#[derive(Clone)]
pub struct CreateBatchState {
    /// The database connection for managing batches.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The client for the upstream Plaid API.
    pub plaid: Arc<dyn PlaidApi>,
    /// The server-side Plaid credentials that requests fall back to.
    pub provider_config: ProviderConfig,
}

impl FromRef<AppState> for CreateBatchState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            plaid: state.plaid.clone(),
            provider_config: state.provider_config.clone(),
        }
    }
}

/// The request body for creating a batch.
#[derive(Debug, Deserialize)]
pub struct CreateBatchRequest {
    /// The start of the inclusive date range to fetch.
    pub start_date: Date,
    /// The end of the inclusive date range to fetch.
    pub end_date: Date,
    /// The Plaid access token for the linked item.
    pub access_token: String,
    /// Plaid credentials, falling back to the server environment when empty.
    #[serde(default)]
    pub credentials: PlaidCredentials,
}

/// The response body for a created batch.
#[derive(Debug, Serialize)]
pub struct CreateBatchResponse {
    /// The ID of the new batch.
    pub batch_id: String,
    /// The batch's initial status.
    pub status: BatchStatus,
    /// How many previously-unseen transactions were stored.
    pub total_transactions: i64,
    /// A human-readable summary of the ingestion.
    pub message: String,
}

/// A route handler that fetches transactions from Plaid for a date range and
/// stores the previously-unseen ones as a new batch.
///
/// The date range and access token are validated before anything is fetched
/// or written; a provider failure leaves no partial batch behind.
pub async fn create_batch_endpoint(
    State(state): State<CreateBatchState>,
    Json(request): Json<CreateBatchRequest>,
) -> Result<(StatusCode, Json<CreateBatchResponse>), Error> {
    if request.start_date > request.end_date {
        return Err(Error::InvalidDateRange(request.start_date, request.end_date));
    }
    if request.access_token.is_empty() {
        return Err(Error::EmptyAccessToken);
    }

    let credentials = request.credentials.resolve(&state.provider_config)?;

    // The fetch happens before the store lock is taken so the database is
    // never held across network I/O.
    let fetch = state
        .plaid
        .fetch_transactions(
            &credentials,
            &request.access_token,
            request.start_date,
            request.end_date,
        )
        .await?;

    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLock
    })?;

    let outcome = ingest_batch(
        &fetch.transactions,
        request.start_date,
        request.end_date,
        &connection,
    )?;

    let message = format!(
        "Stored {} new transactions ({} duplicates skipped)",
        outcome.batch.total_transactions, outcome.duplicate_count
    );
    tracing::info!("Created batch {}: {}", outcome.batch.id, message);

    Ok((
        StatusCode::CREATED,
        Json(CreateBatchResponse {
            batch_id: outcome.batch.id,
            status: outcome.batch.status,
            total_transactions: outcome.batch.total_transactions,
            message,
        }),
    ))
}
