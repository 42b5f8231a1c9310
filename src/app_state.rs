//! Implements a struct that holds the state of the proxy server.

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::Connection;

use crate::{
    Error,
    batch::MarkPolicy,
    db::initialize,
    pagination::PaginationConfig,
    plaid::{PlaidApi, ProviderConfig},
};

/// The state of the proxy server.
#[derive(Clone)]
pub struct AppState {
    /// The database connection
    pub db_connection: Arc<Mutex<Connection>>,

    /// The client for the upstream Plaid API.
    pub plaid: Arc<dyn PlaidApi>,

    /// The server-side Plaid credentials that requests fall back to.
    pub provider_config: ProviderConfig,

    /// The config that controls the default page sizes.
    pub pagination_config: PaginationConfig,

    /// How mark-processed calls treat transaction IDs outside the batch.
    pub mark_policy: MarkPolicy,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for
    /// the domain models.
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(
        db_connection: Connection,
        plaid: Arc<dyn PlaidApi>,
        provider_config: ProviderConfig,
        pagination_config: PaginationConfig,
        mark_policy: MarkPolicy,
    ) -> Result<Self, Error> {
        initialize(&db_connection)?;

        Ok(Self {
            db_connection: Arc::new(Mutex::new(db_connection)),
            plaid,
            provider_config,
            pagination_config,
            mark_policy,
        })
    }
}

impl FromRef<AppState> for ProviderConfig {
    fn from_ref(state: &AppState) -> Self {
        state.provider_config.clone()
    }
}
