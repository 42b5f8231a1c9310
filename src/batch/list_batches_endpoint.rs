//! Defines the endpoint for listing batch summaries.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Query, State},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{AppState, Error, pagination::PaginationConfig};

use super::core::BatchStatus;
use super::query::{BatchSummary, list_batches};

/// The state needed to list batches.
#[derive(Clone)]
pub struct ListBatchesState {
    /// The database connection for reading batches.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The config that controls the default listing size.
    pub pagination_config: PaginationConfig,
}

impl FromRef<AppState> for ListBatchesState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            pagination_config: state.pagination_config.clone(),
        }
    }
}

/// The query parameters for the batch listing.
#[derive(Debug, Default, Deserialize)]
pub struct ListBatchesParams {
    /// If set, only return batches with this status.
    pub status: Option<BatchStatus>,
    /// The maximum number of summaries to return.
    pub limit: Option<u64>,
}

/// The batch summaries, most recent first.
#[derive(Debug, Serialize)]
pub struct BatchList {
    /// The batch summaries with their derived progress percentage.
    pub batches: Vec<BatchSummary>,
    /// How many summaries are in the listing.
    pub count: usize,
}

/// A route handler that lists batch summaries, most recent first.
pub async fn list_batches_endpoint(
    State(state): State<ListBatchesState>,
    Query(params): Query<ListBatchesParams>,
) -> Result<Json<BatchList>, Error> {
    let limit = params
        .limit
        .unwrap_or(state.pagination_config.default_batch_limit);

    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLock
    })?;

    let batches = list_batches(params.status, limit, &connection)?;

    Ok(Json(BatchList {
        count: batches.len(),
        batches,
    }))
}
