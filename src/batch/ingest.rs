//! The deduplicating ingestor that turns a provider fetch into a stored
//! batch.

use rusqlite::Connection;
use time::{Date, OffsetDateTime};

use crate::{Error, plaid::RawTransaction};

use super::core::{Batch, BatchStatus, count_batches};

/// The result of ingesting a fetch result into a new batch.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestOutcome {
    /// The batch that was created.
    pub batch: Batch,
    /// How many records were skipped because their transaction ID already
    /// exists in the store.
    pub duplicate_count: usize,
    /// How many records were skipped because they had no usable transaction
    /// ID or could not be serialized.
    pub skipped_count: usize,
}

/// Store a fetch result as a new batch, inserting only previously-unseen
/// transactions.
///
/// The batch row, all transaction inserts, and the final total update are a
/// single SQL transaction: either the whole batch becomes visible or none of
/// it does. Deduplication relies on the primary-key constraint on the
/// transaction ID (`ON CONFLICT DO NOTHING`), so two concurrent ingestions
/// of overlapping ranges each keep only the IDs the other has not committed.
///
/// Records without a usable transaction ID are logged and skipped; they
/// never abort the batch.
///
/// **Note**: A repeated ingestion of the same fetch result produces a new
/// batch with `total_transactions` of 0.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an unexpected SQL error.
pub fn ingest_batch(
    records: &[RawTransaction],
    start_date: Date,
    end_date: Date,
    connection: &Connection,
) -> Result<IngestOutcome, Error> {
    let tx = connection.unchecked_transaction()?;

    let created_at = OffsetDateTime::now_utc();
    let batch_id = generate_batch_id(created_at, &tx)?;

    tx.execute(
        "INSERT INTO transaction_batches \
         (id, status, created_at, total_transactions, processed_transactions, \
          start_date, end_date) \
         VALUES (?1, 'pending', ?2, 0, 0, ?3, ?4)",
        (&batch_id, created_at, start_date, end_date),
    )?;

    let mut inserted: i64 = 0;
    let mut duplicate_count = 0;
    let mut skipped_count = 0;

    {
        // Prepare the insert statement once for reuse
        let mut stmt = tx.prepare(
            "INSERT INTO transactions (id, batch_id, data, processed, created_at) \
             VALUES (?1, ?2, ?3, 0, ?4) \
             ON CONFLICT(id) DO NOTHING",
        )?;

        for record in records {
            let Some(transaction_id) = record.transaction_id() else {
                tracing::warn!("Skipping transaction record without a transaction ID");
                skipped_count += 1;
                continue;
            };

            let document = match record.to_document() {
                Ok(document) => document,
                Err(error) => {
                    tracing::warn!("Skipping transaction {transaction_id}: {error}");
                    skipped_count += 1;
                    continue;
                }
            };

            let changed = stmt.execute((transaction_id, &batch_id, &document, created_at))?;
            if changed == 0 {
                duplicate_count += 1;
            } else {
                inserted += 1;
            }
        }
    }

    // The novel count is only known after iterating the fetch result, so the
    // batch row is completed in place before the transaction commits.
    tx.execute(
        "UPDATE transaction_batches SET total_transactions = ?1 WHERE id = ?2",
        (inserted, &batch_id),
    )?;

    tx.commit()?;

    Ok(IngestOutcome {
        batch: Batch {
            id: batch_id,
            status: BatchStatus::Pending,
            created_at,
            total_transactions: inserted,
            processed_transactions: 0,
            start_date,
            end_date,
            error_message: None,
        },
        duplicate_count,
        skipped_count,
    })
}

/// Generate a batch ID from the creation time and the batch count.
///
/// Creations are serialized by the store-level connection lock, so the count
/// suffix keeps IDs unique even within one second.
fn generate_batch_id(created_at: OffsetDateTime, connection: &Connection) -> Result<String, Error> {
    let count = count_batches(connection)?;

    Ok(format!(
        "batch_{:04}{:02}{:02}{:02}{:02}{:02}_{}",
        created_at.year(),
        created_at.month() as u8,
        created_at.day(),
        created_at.hour(),
        created_at.minute(),
        created_at.second(),
        count + 1
    ))
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use serde_json::json;
    use time::macros::date;

    use crate::{db::initialize, plaid::RawTransaction};

    use super::super::core::BatchStatus;
    use super::ingest_batch;

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    fn make_records(ids: &[&str]) -> Vec<RawTransaction> {
        ids.iter()
            .map(|id| {
                RawTransaction::new(json!({
                    "transaction_id": id,
                    "amount": 12.34,
                    "date": "2024-01-15",
                    "name": format!("Merchant {id}"),
                }))
            })
            .collect()
    }

    fn count_transaction_rows(connection: &Connection) -> i64 {
        connection
            .query_row("SELECT COUNT(id) FROM transactions", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn ingest_stores_novel_transactions() {
        let conn = get_test_connection();
        let records = make_records(&[
            "t1", "t2", "t3", "t4", "t5", "t6", "t7", "t8", "t9", "t10",
        ]);

        let outcome =
            ingest_batch(&records, date!(2024 - 01 - 01), date!(2024 - 01 - 31), &conn).unwrap();

        assert_eq!(outcome.batch.total_transactions, 10);
        assert_eq!(outcome.batch.processed_transactions, 0);
        assert_eq!(outcome.batch.status, BatchStatus::Pending);
        assert_eq!(outcome.duplicate_count, 0);
        assert_eq!(outcome.skipped_count, 0);
        assert_eq!(count_transaction_rows(&conn), 10);
    }

    #[test]
    fn reingesting_the_same_ids_creates_an_empty_batch() {
        let conn = get_test_connection();
        let records = make_records(&[
            "t1", "t2", "t3", "t4", "t5", "t6", "t7", "t8", "t9", "t10",
        ]);
        ingest_batch(&records, date!(2024 - 01 - 01), date!(2024 - 01 - 31), &conn).unwrap();

        let outcome =
            ingest_batch(&records, date!(2024 - 01 - 01), date!(2024 - 01 - 31), &conn).unwrap();

        assert_eq!(outcome.batch.total_transactions, 0);
        assert_eq!(outcome.duplicate_count, 10);
        assert_eq!(count_transaction_rows(&conn), 10);
    }

    #[test]
    fn overlapping_ingest_stores_only_novel_ids() {
        let conn = get_test_connection();
        ingest_batch(
            &make_records(&["t1", "t2", "t3"]),
            date!(2024 - 01 - 01),
            date!(2024 - 01 - 15),
            &conn,
        )
        .unwrap();

        let outcome = ingest_batch(
            &make_records(&["t2", "t3", "t4", "t5"]),
            date!(2024 - 01 - 10),
            date!(2024 - 01 - 31),
            &conn,
        )
        .unwrap();

        assert_eq!(outcome.batch.total_transactions, 2);
        assert_eq!(outcome.duplicate_count, 2);
        assert_eq!(count_transaction_rows(&conn), 5);
    }

    #[test]
    fn transactions_stay_with_the_batch_that_first_saw_them() {
        let conn = get_test_connection();
        let first = ingest_batch(
            &make_records(&["t1"]),
            date!(2024 - 01 - 01),
            date!(2024 - 01 - 15),
            &conn,
        )
        .unwrap();
        ingest_batch(
            &make_records(&["t1"]),
            date!(2024 - 01 - 10),
            date!(2024 - 01 - 31),
            &conn,
        )
        .unwrap();

        let owner: String = conn
            .query_row(
                "SELECT batch_id FROM transactions WHERE id = 't1'",
                [],
                |row| row.get(0),
            )
            .unwrap();

        assert_eq!(owner, first.batch.id);
    }

    #[test]
    fn malformed_records_are_skipped_without_aborting() {
        let conn = get_test_connection();
        let records = vec![
            RawTransaction::new(json!({ "transaction_id": "t1", "amount": 1.0 })),
            RawTransaction::new(json!({ "amount": 2.0 })),
            RawTransaction::new(json!({ "transaction_id": "", "amount": 3.0 })),
            RawTransaction::new(json!({ "transaction_id": "t2", "amount": 4.0 })),
        ];

        let outcome =
            ingest_batch(&records, date!(2024 - 01 - 01), date!(2024 - 01 - 31), &conn).unwrap();

        assert_eq!(outcome.batch.total_transactions, 2);
        assert_eq!(outcome.skipped_count, 2);
        assert_eq!(outcome.duplicate_count, 0);
        assert_eq!(count_transaction_rows(&conn), 2);
    }

    #[test]
    fn batch_ids_are_unique_within_one_second() {
        let conn = get_test_connection();

        let first = ingest_batch(
            &make_records(&["t1"]),
            date!(2024 - 01 - 01),
            date!(2024 - 01 - 31),
            &conn,
        )
        .unwrap();
        let second = ingest_batch(
            &make_records(&["t2"]),
            date!(2024 - 01 - 01),
            date!(2024 - 01 - 31),
            &conn,
        )
        .unwrap();

        assert_ne!(first.batch.id, second.batch.id);
    }

    #[test]
    fn stored_payload_round_trips_verbatim() {
        let conn = get_test_connection();
        let payload = json!({
            "transaction_id": "t1",
            "amount": 12.34,
            "iso_currency_code": "USD",
            "pending": false,
            "category": ["Food and Drink", "Restaurants"],
        });
        ingest_batch(
            &[RawTransaction::new(payload.clone())],
            date!(2024 - 01 - 01),
            date!(2024 - 01 - 31),
            &conn,
        )
        .unwrap();

        let stored: String = conn
            .query_row("SELECT data FROM transactions WHERE id = 't1'", [], |row| {
                row.get(0)
            })
            .unwrap();

        assert_eq!(
            serde_json::from_str::<serde_json::Value>(&stored).unwrap(),
            payload
        );
    }
}
