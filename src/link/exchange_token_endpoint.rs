//! Defines the endpoint for exchanging a public token for an access token.

use axum::{Json, extract::State};
use serde::Deserialize;

use crate::{
    Error,
    plaid::{ExchangeTokenData, PlaidCredentials},
};

use super::core::PlaidGatewayState;

/// The request body for exchanging a public token.
#[derive(Debug, Deserialize)]
pub struct ExchangeTokenRequest {
    /// The public token produced by the Link widget.
    pub public_token: String,
    /// Plaid credentials, falling back to the server environment when empty.
    #[serde(default)]
    pub credentials: PlaidCredentials,
}

/// A route handler that exchanges a public token from the Link widget for a
/// long-lived access token.
///
/// # Errors
/// This function will return a:
/// - [Error::MissingCredentials] if neither the request nor the server
///   environment provides Plaid credentials,
/// - or [Error::Provider] if the Plaid API rejects the request.
pub async fn exchange_public_token_endpoint(
    State(state): State<PlaidGatewayState>,
    Json(request): Json<ExchangeTokenRequest>,
) -> Result<Json<ExchangeTokenData>, Error> {
    let credentials = request.credentials.resolve(&state.provider_config)?;

    let exchange = state
        .plaid
        .exchange_public_token(&credentials, &request.public_token)
        .await?;

    Ok(Json(exchange))
}

#[cfg(test)]
mod tests {
    use axum::{Json, extract::State};

    use crate::{Error, plaid::PlaidCredentials, test_stub::StubPlaid};

    use super::super::core::test_helpers::get_test_gateway;
    use super::{ExchangeTokenRequest, exchange_public_token_endpoint};

    fn make_request() -> ExchangeTokenRequest {
        ExchangeTokenRequest {
            public_token: "public-sandbox-123".to_string(),
            credentials: PlaidCredentials::default(),
        }
    }

    #[tokio::test]
    async fn returns_the_access_token() {
        let state = get_test_gateway(StubPlaid::with_transactions(Vec::new()));

        let Json(data) = exchange_public_token_endpoint(State(state), Json(make_request()))
            .await
            .unwrap();

        assert_eq!(data.access_token, "access-sandbox-public-sandbox-123");
        assert_eq!(data.item_id, "item-stub-1");
    }

    #[tokio::test]
    async fn surfaces_provider_failures() {
        let state = get_test_gateway(StubPlaid::failing("INVALID_PUBLIC_TOKEN"));

        let result = exchange_public_token_endpoint(State(state), Json(make_request())).await;

        assert!(matches!(result.err(), Some(Error::Provider(_))));
    }
}
