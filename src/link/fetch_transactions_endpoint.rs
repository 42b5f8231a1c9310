//! Defines the endpoint for fetching raw transactions without storing them.

use axum::{Json, extract::State};
use serde::Deserialize;
use time::{Date, Duration, OffsetDateTime};

use crate::{
    Error,
    plaid::{PlaidCredentials, TransactionsFetch},
};

use super::core::PlaidGatewayState;

/// The request body for a raw transaction fetch.
#[derive(Debug, Deserialize)]
pub struct FetchTransactionsRequest {
    /// The Plaid access token for the linked item.
    pub access_token: String,
    /// The start of the inclusive date range. Defaults to 30 days before the
    /// end date.
    pub start_date: Option<Date>,
    /// The end of the inclusive date range. Defaults to today.
    pub end_date: Option<Date>,
    /// Plaid credentials, falling back to the server environment when empty.
    #[serde(default)]
    pub credentials: PlaidCredentials,
}

/// A route handler that fetches transactions from Plaid for a date range and
/// returns them without persisting anything.
///
/// Omitted dates fall back to the last 30 days.
///
/// # Errors
/// This function will return a:
/// - [Error::MissingCredentials] if neither the request nor the server
///   environment provides Plaid credentials,
/// - or [Error::Provider] if the Plaid API rejects the request.
pub async fn fetch_transactions_endpoint(
    State(state): State<PlaidGatewayState>,
    Json(request): Json<FetchTransactionsRequest>,
) -> Result<Json<TransactionsFetch>, Error> {
    let credentials = request.credentials.resolve(&state.provider_config)?;

    let end_date = request
        .end_date
        .unwrap_or_else(|| OffsetDateTime::now_utc().date());
    let start_date = request
        .start_date
        .unwrap_or_else(|| end_date - Duration::days(30));

    let fetch = state
        .plaid
        .fetch_transactions(&credentials, &request.access_token, start_date, end_date)
        .await?;

    Ok(Json(fetch))
}
