//! Defines the endpoint for reading a batch's current state.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State},
};
use rusqlite::Connection;

use crate::{AppState, Error};

use super::core::{Batch, get_batch};

/// The state needed to read a batch.
#[derive(Clone)]
pub struct BatchStatusState {
    /// The database connection for reading batches.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for BatchStatusState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler that returns the batch row verbatim.
///
/// # Errors
/// Returns an [Error::NotFound] if `batch_id` does not refer to a valid
/// batch.
pub async fn batch_status_endpoint(
    State(state): State<BatchStatusState>,
    Path(batch_id): Path<String>,
) -> Result<Json<Batch>, Error> {
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLock
    })?;

    let batch = get_batch(&batch_id, &connection)?;

    Ok(Json(batch))
}
