//! Defines the core data models and database schema for transaction batches.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::Error;

// ============================================================================
// MODELS
// ============================================================================

/// The aggregate processing state of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    /// The batch has transactions that have not been marked processed yet,
    /// or contains no transactions at all.
    Pending,
    /// Every transaction in the batch has been marked processed.
    ///
    /// A batch never leaves this status.
    Completed,
    /// Reserved for ingestion failures. Nothing sets this automatically;
    /// failed ingestions surface an error to the caller without persisting
    /// a batch.
    Error,
}

impl BatchStatus {
    /// The lowercase name stored in the database.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }
}

/// A date-ranged ingestion unit grouping the transactions that were first
/// seen when it was created.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Batch {
    /// The ID of the batch, derived from its creation time and the batch
    /// count.
    pub id: String,
    /// The aggregate processing state.
    pub status: BatchStatus,
    /// When the batch was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// How many previously-unseen transactions were stored for this batch.
    /// Fixed once ingestion completes.
    pub total_transactions: i64,
    /// How many of the batch's transactions are currently marked processed.
    pub processed_transactions: i64,
    /// The start of the date range the batch was fetched for.
    pub start_date: Date,
    /// The end of the date range the batch was fetched for.
    pub end_date: Date,
    /// Set only if ingestion fails before persistence (best effort).
    pub error_message: Option<String>,
}

/// A transaction record owned by the batch in which it was first seen.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredTransaction {
    /// The provider's transaction ID, unique across the entire store.
    pub id: String,
    /// The batch the transaction was first seen in.
    pub batch_id: String,
    /// The full provider payload, preserved verbatim.
    pub data: serde_json::Value,
    /// Whether a downstream consumer has marked this transaction processed.
    /// Settable only to true, never reset.
    pub processed: bool,
    /// When the transaction was ingested.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create the batch and transaction tables in the database.
///
/// The transaction table's primary key is the provider's transaction ID,
/// which is what enforces global deduplication: an insert of an ID that
/// exists in any prior batch hits the constraint instead of racing a
/// separate existence check.
///
/// # Errors
/// Returns an error if the tables cannot be created or if there is an SQL error.
pub fn create_batch_tables(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS transaction_batches (
                id TEXT PRIMARY KEY,
                status TEXT NOT NULL DEFAULT 'pending',
                created_at TEXT NOT NULL,
                total_transactions INTEGER NOT NULL DEFAULT 0,
                processed_transactions INTEGER NOT NULL DEFAULT 0,
                start_date TEXT NOT NULL,
                end_date TEXT NOT NULL,
                error_message TEXT
                )",
        (),
    )?;

    connection.execute(
        "CREATE TABLE IF NOT EXISTS transactions (
                id TEXT PRIMARY KEY,
                batch_id TEXT NOT NULL,
                data TEXT NOT NULL,
                processed INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                FOREIGN KEY(batch_id) REFERENCES transaction_batches(id)
                )",
        (),
    )?;

    // Index used by the processed-count recomputation and the filtered
    // transaction listing.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transactions_batch_processed
             ON transactions(batch_id, processed);",
        (),
    )?;

    Ok(())
}

/// Retrieve a batch from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid batch,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_batch(id: &str, connection: &Connection) -> Result<Batch, Error> {
    let batch = connection
        .prepare(
            "SELECT id, status, created_at, total_transactions, processed_transactions, \
             start_date, end_date, error_message \
             FROM transaction_batches WHERE id = :id",
        )?
        .query_one(&[(":id", &id)], map_batch_row)?;

    Ok(batch)
}

/// Get the total number of batches in the database.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is some SQL error.
pub fn count_batches(connection: &Connection) -> Result<i64, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM transaction_batches;", [], |row| {
            row.get(0)
        })
        .map_err(|error| error.into())
}

/// Map a database row to a [Batch].
pub fn map_batch_row(row: &Row) -> Result<Batch, rusqlite::Error> {
    let raw_status: String = row.get(1)?;
    let status = parse_status(&raw_status, 1)?;

    Ok(Batch {
        id: row.get(0)?,
        status,
        created_at: row.get(2)?,
        total_transactions: row.get(3)?,
        processed_transactions: row.get(4)?,
        start_date: row.get(5)?,
        end_date: row.get(6)?,
        error_message: row.get(7)?,
    })
}

/// Map a database row to a [StoredTransaction].
pub fn map_stored_transaction_row(row: &Row) -> Result<StoredTransaction, rusqlite::Error> {
    let raw_data: String = row.get(2)?;
    let data = serde_json::from_str(&raw_data).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(error))
    })?;

    Ok(StoredTransaction {
        id: row.get(0)?,
        batch_id: row.get(1)?,
        data,
        processed: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn parse_status(raw: &str, column: usize) -> Result<BatchStatus, rusqlite::Error> {
    match raw {
        "pending" => Ok(BatchStatus::Pending),
        "completed" => Ok(BatchStatus::Completed),
        "error" => Ok(BatchStatus::Error),
        other => Err(rusqlite::Error::FromSqlConversionFailure(
            column,
            rusqlite::types::Type::Text,
            format!("unknown batch status {other:?}").into(),
        )),
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod database_tests {
    use rusqlite::Connection;
    use time::{OffsetDateTime, macros::date};

    use crate::{Error, db::initialize};

    use super::{BatchStatus, count_batches, get_batch};

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    fn insert_test_batch(id: &str, connection: &Connection) {
        connection
            .execute(
                "INSERT INTO transaction_batches \
                 (id, status, created_at, total_transactions, processed_transactions, \
                  start_date, end_date) \
                 VALUES (?1, 'pending', ?2, 0, 0, ?3, ?4)",
                (
                    id,
                    OffsetDateTime::now_utc(),
                    date!(2024 - 01 - 01),
                    date!(2024 - 01 - 31),
                ),
            )
            .unwrap();
    }

    #[test]
    fn get_batch_returns_row() {
        let conn = get_test_connection();
        insert_test_batch("batch_20240101120000_1", &conn);

        let batch = get_batch("batch_20240101120000_1", &conn).unwrap();

        assert_eq!(batch.id, "batch_20240101120000_1");
        assert_eq!(batch.status, BatchStatus::Pending);
        assert_eq!(batch.total_transactions, 0);
        assert_eq!(batch.processed_transactions, 0);
        assert_eq!(batch.start_date, date!(2024 - 01 - 01));
        assert_eq!(batch.end_date, date!(2024 - 01 - 31));
        assert_eq!(batch.error_message, None);
    }

    #[test]
    fn get_batch_fails_on_unknown_id() {
        let conn = get_test_connection();

        let result = get_batch("batch_missing", &conn);

        assert_eq!(result, Err(Error::NotFound));
    }

    #[test]
    fn get_count() {
        let conn = get_test_connection();
        let want_count = 3;
        for i in 1..=want_count {
            insert_test_batch(&format!("batch_20240101120000_{i}"), &conn);
        }

        let got_count = count_batches(&conn).expect("Could not get count");

        assert_eq!(want_count, got_count);
    }

    #[test]
    fn duplicate_transaction_id_hits_unique_constraint() {
        let conn = get_test_connection();
        insert_test_batch("batch_a", &conn);
        insert_test_batch("batch_b", &conn);
        let now = OffsetDateTime::now_utc();

        conn.execute(
            "INSERT INTO transactions (id, batch_id, data, processed, created_at) \
             VALUES ('txn_1', 'batch_a', '{}', 0, ?1)",
            (now,),
        )
        .unwrap();

        let result = conn.execute(
            "INSERT INTO transactions (id, batch_id, data, processed, created_at) \
             VALUES ('txn_1', 'batch_b', '{}', 0, ?1)",
            (now,),
        );

        assert!(result.is_err());
    }
}
