//! Defines the endpoint for paging through a batch's transactions.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, Query, State},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{AppState, Error, pagination::PaginationConfig};

use super::core::{StoredTransaction, get_batch};
use super::query::list_transactions;

/// The state needed to page through a batch's transactions.
#[derive(Clone)]
pub struct BatchTransactionsState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The config that controls the default page size.
    pub pagination_config: PaginationConfig,
}

impl FromRef<AppState> for BatchTransactionsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            pagination_config: state.pagination_config.clone(),
        }
    }
}

/// The query parameters for the transaction listing.
#[derive(Debug, Default, Deserialize)]
pub struct TransactionPageParams {
    /// The maximum number of transactions to return.
    pub limit: Option<u64>,
    /// How many transactions to skip before the page starts.
    pub offset: Option<u64>,
    /// If set, only return transactions whose processed flag matches.
    pub processed: Option<bool>,
}

/// A page of a batch's transactions plus the window that produced it.
#[derive(Debug, Serialize)]
pub struct TransactionPage {
    /// The ID of the batch the page belongs to.
    pub batch_id: String,
    /// The transactions in the page, ordered by ingestion time.
    pub transactions: Vec<StoredTransaction>,
    /// How many transactions are in this page.
    pub count: usize,
    /// The limit the page was produced with.
    pub limit: u64,
    /// The offset the page was produced with.
    pub offset: u64,
}

/// A route handler that returns a page of a batch's transactions.
///
/// An offset past the end of the batch yields an empty page. The batch
/// itself must exist so that callers can tell an unknown batch apart from a
/// batch with no matching transactions.
///
/// # Errors
/// Returns an [Error::NotFound] if `batch_id` does not refer to a valid
/// batch.
pub async fn batch_transactions_endpoint(
    State(state): State<BatchTransactionsState>,
    Path(batch_id): Path<String>,
    Query(params): Query<TransactionPageParams>,
) -> Result<Json<TransactionPage>, Error> {
    let limit = params.limit.unwrap_or(state.pagination_config.default_limit);
    let offset = params.offset.unwrap_or(0);

    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLock
    })?;

    get_batch(&batch_id, &connection)?;

    let transactions = list_transactions(&batch_id, limit, offset, params.processed, &connection)?;

    Ok(Json(TransactionPage {
        batch_id,
        count: transactions.len(),
        transactions,
        limit,
        offset,
    }))
}
