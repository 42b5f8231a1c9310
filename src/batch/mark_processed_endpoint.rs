//! Defines the endpoint for marking a batch's transactions as processed.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{AppState, Error};

use super::core::BatchStatus;
use super::tracker::{MarkPolicy, mark_processed};

/// The state needed to mark transactions as processed.
#[derive(Clone)]
pub struct MarkProcessedState {
    /// The database connection for updating transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// How transaction IDs outside the batch are treated.
    pub mark_policy: MarkPolicy,
}

impl FromRef<AppState> for MarkProcessedState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            mark_policy: state.mark_policy,
        }
    }
}

/// The request body for marking transactions as processed.
#[derive(Debug, Deserialize)]
pub struct MarkProcessedRequest {
    /// The IDs of the transactions to mark.
    pub transaction_ids: Vec<String>,
}

/// The response body for a mark-processed call.
#[derive(Debug, Serialize)]
pub struct MarkProcessedResponse {
    /// How many transactions transitioned from unprocessed to processed.
    pub marked_count: usize,
    /// The batch's processed count after this call.
    pub processed_transactions: i64,
    /// The batch's status after this call.
    pub status: BatchStatus,
}

/// A route handler that marks a batch's transactions as processed and
/// reports the recomputed batch state.
///
/// Re-marking an already-processed transaction is a no-op. Repeating an
/// entire call leaves the batch in the same state it reached the first time.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `batch_id` does not refer to a valid batch,
/// - or [Error::UnknownTransactionIds] if the strict [MarkPolicy] is active
///   and an ID does not belong to the batch.
pub async fn mark_processed_endpoint(
    State(state): State<MarkProcessedState>,
    Path(batch_id): Path<String>,
    Json(request): Json<MarkProcessedRequest>,
) -> Result<Json<MarkProcessedResponse>, Error> {
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLock
    })?;

    let outcome = mark_processed(
        &batch_id,
        &request.transaction_ids,
        state.mark_policy,
        &connection,
    )?;

    tracing::info!(
        "Marked {} transactions processed in batch {batch_id} ({} processed, status {})",
        outcome.marked_count,
        outcome.processed_transactions,
        outcome.status.as_str(),
    );

    Ok(Json(MarkProcessedResponse {
        marked_count: outcome.marked_count,
        processed_transactions: outcome.processed_transactions,
        status: outcome.status,
    }))
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Json,
        extract::{Path, State},
    };
    use rusqlite::Connection;
    use serde_json::json;
    use time::macros::date;

    use crate::{Error, db::initialize, plaid::RawTransaction};

    use super::super::core::BatchStatus;
    use super::super::ingest::ingest_batch;
    use super::super::tracker::MarkPolicy;
    use super::{MarkProcessedRequest, MarkProcessedState, mark_processed_endpoint};

    fn get_test_state(policy: MarkPolicy) -> MarkProcessedState {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        MarkProcessedState {
            db_connection: Arc::new(Mutex::new(conn)),
            mark_policy: policy,
        }
    }

    fn ingest_test_batch(ids: &[&str], state: &MarkProcessedState) -> String {
        let records: Vec<RawTransaction> = ids
            .iter()
            .map(|id| RawTransaction::new(json!({ "transaction_id": id })))
            .collect();
        let connection = state.db_connection.lock().unwrap();

        ingest_batch(
            &records,
            date!(2024 - 01 - 01),
            date!(2024 - 01 - 31),
            &connection,
        )
        .unwrap()
        .batch
        .id
    }

    fn make_request(ids: &[&str]) -> MarkProcessedRequest {
        MarkProcessedRequest {
            transaction_ids: ids.iter().map(|id| id.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn marking_a_subset_reports_partial_progress() {
        let state = get_test_state(MarkPolicy::Permissive);
        let batch_id = ingest_test_batch(&["t1", "t2", "t3"], &state);

        let Json(response) = mark_processed_endpoint(
            State(state),
            Path(batch_id),
            Json(make_request(&["t1", "t2"])),
        )
        .await
        .unwrap();

        assert_eq!(response.marked_count, 2);
        assert_eq!(response.processed_transactions, 2);
        assert_eq!(response.status, BatchStatus::Pending);
    }

    #[tokio::test]
    async fn marking_every_transaction_completes_the_batch() {
        let state = get_test_state(MarkPolicy::Permissive);
        let batch_id = ingest_test_batch(&["t1", "t2"], &state);

        let Json(response) = mark_processed_endpoint(
            State(state),
            Path(batch_id),
            Json(make_request(&["t1", "t2"])),
        )
        .await
        .unwrap();

        assert_eq!(response.marked_count, 2);
        assert_eq!(response.status, BatchStatus::Completed);
    }

    #[tokio::test]
    async fn repeated_calls_converge() {
        let state = get_test_state(MarkPolicy::Permissive);
        let batch_id = ingest_test_batch(&["t1", "t2", "t3"], &state);

        mark_processed_endpoint(
            State(state.clone()),
            Path(batch_id.clone()),
            Json(make_request(&["t1"])),
        )
        .await
        .unwrap();
        let Json(response) =
            mark_processed_endpoint(State(state), Path(batch_id), Json(make_request(&["t1"])))
                .await
                .unwrap();

        assert_eq!(response.marked_count, 0);
        assert_eq!(response.processed_transactions, 1);
    }

    #[tokio::test]
    async fn fails_on_unknown_batch_id() {
        let state = get_test_state(MarkPolicy::Permissive);

        let result = mark_processed_endpoint(
            State(state),
            Path("batch_missing".to_string()),
            Json(make_request(&["t1"])),
        )
        .await;

        assert_eq!(result.err(), Some(Error::NotFound));
    }

    #[tokio::test]
    async fn strict_policy_rejects_ids_outside_the_batch() {
        let state = get_test_state(MarkPolicy::RejectUnknownIds);
        let batch_id = ingest_test_batch(&["t1"], &state);

        let result = mark_processed_endpoint(
            State(state),
            Path(batch_id),
            Json(make_request(&["t1", "t_unknown"])),
        )
        .await;

        assert_eq!(
            result.err(),
            Some(Error::UnknownTransactionIds(vec!["t_unknown".to_string()]))
        );
    }
}
