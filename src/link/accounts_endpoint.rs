//! Defines the endpoint for listing the accounts linked to an access token.

use axum::{Json, extract::State};
use serde::Deserialize;

use crate::{
    Error,
    plaid::{AccountsData, PlaidCredentials},
};

use super::core::PlaidGatewayState;

/// The request body for listing linked accounts.
#[derive(Debug, Deserialize)]
pub struct AccountsRequest {
    /// The Plaid access token for the linked item.
    pub access_token: String,
    /// Plaid credentials, falling back to the server environment when empty.
    #[serde(default)]
    pub credentials: PlaidCredentials,
}

/// A route handler that lists the accounts linked to an access token,
/// passing the provider payload through opaquely.
///
/// # Errors
/// This function will return a:
/// - [Error::MissingCredentials] if neither the request nor the server
///   environment provides Plaid credentials,
/// - or [Error::Provider] if the Plaid API rejects the request.
pub async fn get_accounts_endpoint(
    State(state): State<PlaidGatewayState>,
    Json(request): Json<AccountsRequest>,
) -> Result<Json<AccountsData>, Error> {
    let credentials = request.credentials.resolve(&state.provider_config)?;

    let accounts = state
        .plaid
        .get_accounts(&credentials, &request.access_token)
        .await?;

    Ok(Json(accounts))
}
