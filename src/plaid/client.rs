//! The `reqwest`-backed Plaid client and the trait route handlers depend on.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::json;
use time::Date;

use crate::Error;

use super::models::{
    AccountsData, ExchangeTokenData, LinkTokenData, ResolvedCredentials, TransactionsFetch,
};

/// How long to wait for Plaid before giving up on a request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// The operations the proxy needs from the Plaid API.
///
/// Route handlers hold an `Arc<dyn PlaidApi>` so tests can substitute a stub
/// that never touches the network.
#[async_trait]
pub trait PlaidApi: Send + Sync {
    /// Create a Link token for initializing the Plaid Link widget.
    async fn create_link_token(
        &self,
        credentials: &ResolvedCredentials,
        user_id: &str,
        country_codes: &[String],
    ) -> Result<LinkTokenData, Error>;

    /// Exchange a public token from the Link widget for an access token.
    async fn exchange_public_token(
        &self,
        credentials: &ResolvedCredentials,
        public_token: &str,
    ) -> Result<ExchangeTokenData, Error>;

    /// List the accounts linked to an access token.
    async fn get_accounts(
        &self,
        credentials: &ResolvedCredentials,
        access_token: &str,
    ) -> Result<AccountsData, Error>;

    /// Fetch the raw transactions for an inclusive date range.
    async fn fetch_transactions(
        &self,
        credentials: &ResolvedCredentials,
        access_token: &str,
        start_date: Date,
        end_date: Date,
    ) -> Result<TransactionsFetch, Error>;
}

/// The real Plaid client.
#[derive(Debug, Clone)]
pub struct PlaidClient {
    http: reqwest::Client,
}

impl PlaidClient {
    /// Create a Plaid client with the default request timeout.
    ///
    /// # Panics
    /// Panics if the TLS backend cannot be initialized.
    pub fn new() -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("could not build the HTTP client");

        Self { http }
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        credentials: &ResolvedCredentials,
        path: &str,
        body: serde_json::Value,
    ) -> Result<T, Error> {
        let url = format!("{}{}", credentials.environment.base_url(), path);

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|error| Error::Provider(format!("Plaid API request failed: {error}")))?;

        let status = response.status();
        if !status.is_success() {
            let payload = response.json::<serde_json::Value>().await.ok();
            return Err(plaid_api_error(status.as_u16(), payload));
        }

        response
            .json::<T>()
            .await
            .map_err(|error| Error::Provider(format!("Invalid response from Plaid API: {error}")))
    }
}

impl Default for PlaidClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PlaidApi for PlaidClient {
    async fn create_link_token(
        &self,
        credentials: &ResolvedCredentials,
        user_id: &str,
        country_codes: &[String],
    ) -> Result<LinkTokenData, Error> {
        tracing::info!(
            "Creating link token for user {user_id} in {}",
            credentials.environment.as_str()
        );

        self.post_json(
            credentials,
            "/link/token/create",
            json!({
                "client_id": credentials.client_id,
                "secret": credentials.secret,
                "client_name": "Second Brain Obsidian Plugin",
                "language": "en",
                "country_codes": country_codes,
                "products": ["transactions"],
                "user": { "client_user_id": user_id },
            }),
        )
        .await
    }

    async fn exchange_public_token(
        &self,
        credentials: &ResolvedCredentials,
        public_token: &str,
    ) -> Result<ExchangeTokenData, Error> {
        tracing::info!("Exchanging public token for access token");

        self.post_json(
            credentials,
            "/item/public_token/exchange",
            json!({
                "client_id": credentials.client_id,
                "secret": credentials.secret,
                "public_token": public_token,
            }),
        )
        .await
    }

    async fn get_accounts(
        &self,
        credentials: &ResolvedCredentials,
        access_token: &str,
    ) -> Result<AccountsData, Error> {
        tracing::info!("Fetching accounts");

        self.post_json(
            credentials,
            "/accounts/get",
            json!({
                "client_id": credentials.client_id,
                "secret": credentials.secret,
                "access_token": access_token,
            }),
        )
        .await
    }

    async fn fetch_transactions(
        &self,
        credentials: &ResolvedCredentials,
        access_token: &str,
        start_date: Date,
        end_date: Date,
    ) -> Result<TransactionsFetch, Error> {
        tracing::info!("Fetching transactions from {start_date} to {end_date}");

        let fetch: TransactionsFetch = self
            .post_json(
                credentials,
                "/transactions/get",
                json!({
                    "client_id": credentials.client_id,
                    "secret": credentials.secret,
                    "access_token": access_token,
                    "start_date": start_date.to_string(),
                    "end_date": end_date.to_string(),
                }),
            )
            .await?;

        tracing::info!("Retrieved {} transactions", fetch.transactions.len());

        Ok(fetch)
    }
}

/// Format a Plaid error response the way downstream clients expect.
///
/// Plaid error payloads carry `error_type`, `error_code`, and
/// `display_message` fields; responses that are not JSON fall back to the
/// HTTP status code.
fn plaid_api_error(status: u16, payload: Option<serde_json::Value>) -> Error {
    let Some(payload) = payload else {
        return Error::Provider(format!("Plaid API Error: HTTP status {status}"));
    };

    tracing::error!("Plaid API Exception - Status: {status}, Body: {payload}");

    let error_type = payload
        .get("error_type")
        .and_then(serde_json::Value::as_str)
        .unwrap_or("UNKNOWN_ERROR");
    let error_code = payload
        .get("error_code")
        .and_then(serde_json::Value::as_str)
        .unwrap_or("UNKNOWN");
    let message = payload
        .get("display_message")
        .and_then(serde_json::Value::as_str)
        .or_else(|| payload.get("error_message").and_then(serde_json::Value::as_str))
        .unwrap_or("no message provided");

    Error::Provider(format!(
        "Plaid API Error ({error_type}/{error_code}): {message}"
    ))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::Error;

    use super::plaid_api_error;

    #[test]
    fn formats_structured_error_payload() {
        let error = plaid_api_error(
            400,
            Some(json!({
                "error_type": "INVALID_INPUT",
                "error_code": "INVALID_ACCESS_TOKEN",
                "display_message": "The access token is invalid.",
            })),
        );

        assert_eq!(
            error,
            Error::Provider(
                "Plaid API Error (INVALID_INPUT/INVALID_ACCESS_TOKEN): \
                 The access token is invalid."
                    .to_string()
            )
        );
    }

    #[test]
    fn falls_back_to_error_message_field() {
        let error = plaid_api_error(
            400,
            Some(json!({
                "error_type": "INVALID_REQUEST",
                "error_code": "MISSING_FIELDS",
                "error_message": "client_id is required",
            })),
        );

        assert_eq!(
            error,
            Error::Provider(
                "Plaid API Error (INVALID_REQUEST/MISSING_FIELDS): client_id is required"
                    .to_string()
            )
        );
    }

    #[test]
    fn falls_back_to_status_without_payload() {
        let error = plaid_api_error(502, None);

        assert_eq!(
            error,
            Error::Provider("Plaid API Error: HTTP status 502".to_string())
        );
    }
}
