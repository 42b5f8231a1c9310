//! The bank-linking surface of the proxy.
//!
//! This module contains the endpoints the Obsidian plugin uses before any
//! batch exists: creating a Plaid Link token, exchanging the public token
//! from the Link widget for an access token, listing linked accounts,
//! fetching raw transactions without storing them, and serving the
//! self-contained Link HTML page.
//!
//! These handlers pass the provider payloads through opaquely; validation
//! and persistence belong to the batch endpoints.

mod accounts_endpoint;
mod core;
mod exchange_token_endpoint;
mod fetch_transactions_endpoint;
mod link_page;
mod link_token_endpoint;

pub use accounts_endpoint::get_accounts_endpoint;
pub use core::PlaidGatewayState;
pub use exchange_token_endpoint::exchange_public_token_endpoint;
pub use fetch_transactions_endpoint::fetch_transactions_endpoint;
pub use link_page::get_link_page;
pub use link_token_endpoint::create_link_token_endpoint;
