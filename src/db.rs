//! Database initialization for the proxy's SQLite store.

use rusqlite::{Connection, Transaction as SqlTransaction};

use crate::{Error, batch::create_batch_tables};

/// Create the tables for the application's data models.
///
/// Safe to call on an existing database: tables are only created if they are
/// missing.
///
/// # Errors
/// Returns an [Error::SqlError] if the tables cannot be created.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    let transaction =
        SqlTransaction::new_unchecked(connection, rusqlite::TransactionBehavior::Exclusive)?;

    create_batch_tables(&transaction)?;

    transaction.commit()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use super::initialize;

    #[test]
    fn initialize_creates_tables() {
        let conn = Connection::open_in_memory().unwrap();

        initialize(&conn).unwrap();

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master \
                 WHERE type = 'table' AND name IN ('transaction_batches', 'transactions')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn initialize_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();

        initialize(&conn).unwrap();
        initialize(&conn).unwrap();
    }
}
