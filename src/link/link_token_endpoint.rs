//! Defines the endpoint for creating a Plaid Link token.

use axum::{Json, extract::State};
use serde::Deserialize;

use crate::{
    Error,
    plaid::{LinkTokenData, PlaidCredentials},
};

use super::core::PlaidGatewayState;

fn default_user_id() -> String {
    "default_user".to_string()
}

fn default_country_codes() -> Vec<String> {
    vec!["US".to_string()]
}

/// The request body for creating a Link token.
#[derive(Debug, Deserialize)]
pub struct LinkTokenRequest {
    /// The user the Link session is created for.
    #[serde(default = "default_user_id")]
    pub user_id: String,
    /// Plaid credentials, falling back to the server environment when empty.
    #[serde(default)]
    pub credentials: PlaidCredentials,
    /// The countries whose institutions the Link widget should offer.
    #[serde(default = "default_country_codes")]
    pub country_codes: Vec<String>,
}

/// A route handler that creates a Plaid Link token for the Link widget.
///
/// # Errors
/// This function will return a:
/// - [Error::MissingCredentials] if neither the request nor the server
///   environment provides Plaid credentials,
/// - or [Error::Provider] if the Plaid API rejects the request.
pub async fn create_link_token_endpoint(
    State(state): State<PlaidGatewayState>,
    Json(request): Json<LinkTokenRequest>,
) -> Result<Json<LinkTokenData>, Error> {
    let credentials = request.credentials.resolve(&state.provider_config)?;

    let link_token = state
        .plaid
        .create_link_token(&credentials, &request.user_id, &request.country_codes)
        .await?;

    Ok(Json(link_token))
}
