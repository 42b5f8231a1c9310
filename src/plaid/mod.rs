//! The client for the upstream Plaid API.
//!
//! This module contains everything related to talking to Plaid:
//! - The [PlaidApi] trait that route handlers depend on, so tests can
//!   substitute a stub for the real network client
//! - The [PlaidClient] implementation backed by `reqwest`
//! - Credential resolution and the raw transaction record wrapper

mod client;
mod models;

pub use client::{PlaidApi, PlaidClient};
pub use models::{
    AccountsData, ExchangeTokenData, LinkTokenData, PlaidCredentials, PlaidEnvironment,
    ProviderConfig, RawTransaction, ResolvedCredentials, TransactionsFetch,
};
