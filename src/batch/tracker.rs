//! Applies processed flags to a batch's transactions and recomputes the
//! batch's aggregate status.

use rusqlite::Connection;

use crate::Error;

use super::core::{BatchStatus, get_batch};

/// How [mark_processed] treats transaction IDs that do not belong to the
/// batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MarkPolicy {
    /// Silently ignore IDs outside the batch.
    #[default]
    Permissive,
    /// Fail the whole call without applying any flags when an ID is not in
    /// the batch.
    RejectUnknownIds,
}

/// The result of a mark-processed call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkOutcome {
    /// How many transactions transitioned from unprocessed to processed in
    /// this call. Re-marking an already-processed ID contributes 0.
    pub marked_count: usize,
    /// The batch's processed count after this call, recomputed from the
    /// persisted flags.
    pub processed_transactions: i64,
    /// The batch's status after this call.
    pub status: BatchStatus,
}

/// Mark the given transactions of a batch as processed and recompute the
/// batch's processed count and status.
///
/// Marking is idempotent: an already-processed ID is a no-op, not an error.
/// The processed count is recomputed from the persisted flags inside the
/// same SQL transaction as the updates, so concurrent or repeated calls
/// converge on the union of all marks instead of losing updates. A batch
/// whose processed count reaches its total (and whose total is non-zero)
/// becomes `completed` and never reverts.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `batch_id` does not refer to a valid batch,
/// - [Error::UnknownTransactionIds] if `policy` is
///   [MarkPolicy::RejectUnknownIds] and an ID does not belong to the batch,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn mark_processed(
    batch_id: &str,
    transaction_ids: &[String],
    policy: MarkPolicy,
    connection: &Connection,
) -> Result<MarkOutcome, Error> {
    let tx = connection.unchecked_transaction()?;

    let batch = get_batch(batch_id, &tx)?;

    if policy == MarkPolicy::RejectUnknownIds {
        let unknown = find_unknown_ids(batch_id, transaction_ids, &tx)?;
        if !unknown.is_empty() {
            return Err(Error::UnknownTransactionIds(unknown));
        }
    }

    let mut marked_count = 0;
    {
        let mut stmt = tx.prepare(
            "UPDATE transactions SET processed = 1 \
             WHERE id = ?1 AND batch_id = ?2 AND processed = 0",
        )?;

        for transaction_id in transaction_ids {
            marked_count += stmt.execute((transaction_id, batch_id))?;
        }
    }

    // Recompute from the persisted flags rather than incrementing.
    let processed_transactions: i64 = tx.query_row(
        "SELECT COUNT(id) FROM transactions WHERE batch_id = ?1 AND processed = 1",
        (batch_id,),
        |row| row.get(0),
    )?;

    let status = if batch.status == BatchStatus::Completed
        || (batch.total_transactions > 0 && processed_transactions == batch.total_transactions)
    {
        BatchStatus::Completed
    } else {
        batch.status
    };

    tx.execute(
        "UPDATE transaction_batches SET processed_transactions = ?1, status = ?2 WHERE id = ?3",
        (processed_transactions, status.as_str(), batch_id),
    )?;

    tx.commit()?;

    Ok(MarkOutcome {
        marked_count,
        processed_transactions,
        status,
    })
}

fn find_unknown_ids(
    batch_id: &str,
    transaction_ids: &[String],
    connection: &Connection,
) -> Result<Vec<String>, Error> {
    let mut stmt = connection
        .prepare("SELECT COUNT(id) FROM transactions WHERE id = ?1 AND batch_id = ?2")?;

    let mut unknown = Vec::new();
    for transaction_id in transaction_ids {
        let count: i64 = stmt.query_row((transaction_id, batch_id), |row| row.get(0))?;
        if count == 0 {
            unknown.push(transaction_id.clone());
        }
    }

    Ok(unknown)
}
