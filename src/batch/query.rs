//! Paginated, filterable queries over batches and their transactions.

use rusqlite::Connection;
use serde::Serialize;
use time::{Date, OffsetDateTime};

use crate::Error;

use super::core::{Batch, BatchStatus, StoredTransaction, map_batch_row, map_stored_transaction_row};

/// A batch row plus the derived progress percentage, for the batch listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSummary {
    /// The ID of the batch.
    pub id: String,
    /// The aggregate processing state.
    pub status: BatchStatus,
    /// When the batch was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// How many transactions were stored for this batch.
    pub total_transactions: i64,
    /// How many of the batch's transactions are marked processed.
    pub processed_transactions: i64,
    /// The start of the date range the batch was fetched for.
    pub start_date: Date,
    /// The end of the date range the batch was fetched for.
    pub end_date: Date,
    /// The processed share as a percentage, 0 for a batch with no
    /// transactions.
    pub progress_percentage: f64,
}

impl BatchSummary {
    fn from_batch(batch: Batch) -> Self {
        let progress_percentage = if batch.total_transactions > 0 {
            batch.processed_transactions as f64 / batch.total_transactions as f64 * 100.0
        } else {
            0.0
        };

        Self {
            id: batch.id,
            status: batch.status,
            created_at: batch.created_at,
            total_transactions: batch.total_transactions,
            processed_transactions: batch.processed_transactions,
            start_date: batch.start_date,
            end_date: batch.end_date,
            progress_percentage,
        }
    }
}

/// Get a page of a batch's transactions, ordered by ingestion time.
///
/// The ordering has the transaction ID as a tiebreaker so that repeated
/// calls with the same window return identical pages. An offset past the end
/// of the batch yields an empty page, not an error.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn list_transactions(
    batch_id: &str,
    limit: u64,
    offset: u64,
    processed_filter: Option<bool>,
    connection: &Connection,
) -> Result<Vec<StoredTransaction>, Error> {
    const COLUMNS: &str = "id, batch_id, data, processed, created_at";

    let rows = match processed_filter {
        Some(processed) => connection
            .prepare(&format!(
                "SELECT {COLUMNS} FROM transactions \
                 WHERE batch_id = ?1 AND processed = ?2 \
                 ORDER BY created_at ASC, id ASC LIMIT ?3 OFFSET ?4"
            ))?
            .query_map(
                (batch_id, processed, limit as i64, offset as i64),
                map_stored_transaction_row,
            )?
            .collect::<Result<Vec<_>, _>>(),
        None => connection
            .prepare(&format!(
                "SELECT {COLUMNS} FROM transactions \
                 WHERE batch_id = ?1 \
                 ORDER BY created_at ASC, id ASC LIMIT ?2 OFFSET ?3"
            ))?
            .query_map(
                (batch_id, limit as i64, offset as i64),
                map_stored_transaction_row,
            )?
            .collect::<Result<Vec<_>, _>>(),
    };

    rows.map_err(Error::from)
}

/// Get batch summaries ordered most recent first.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn list_batches(
    status_filter: Option<BatchStatus>,
    limit: u64,
    connection: &Connection,
) -> Result<Vec<BatchSummary>, Error> {
    const COLUMNS: &str = "id, status, created_at, total_transactions, processed_transactions, \
                           start_date, end_date, error_message";

    let batches = match status_filter {
        Some(status) => connection
            .prepare(&format!(
                "SELECT {COLUMNS} FROM transaction_batches \
                 WHERE status = ?1 \
                 ORDER BY created_at DESC, id DESC LIMIT ?2"
            ))?
            .query_map((status.as_str(), limit as i64), map_batch_row)?
            .collect::<Result<Vec<_>, _>>(),
        None => connection
            .prepare(&format!(
                "SELECT {COLUMNS} FROM transaction_batches \
                 ORDER BY created_at DESC, id DESC LIMIT ?1"
            ))?
            .query_map((limit as i64,), map_batch_row)?
            .collect::<Result<Vec<_>, _>>(),
    }?;

    Ok(batches.into_iter().map(BatchSummary::from_batch).collect())
}
