//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/plaid/transactions/batch/{batch_id}',
//! use [format_endpoint].

/// The service banner.
pub const ROOT: &str = "/";
/// The liveness check.
pub const HEALTH: &str = "/health";
/// The development endpoint reporting whether Plaid credentials are configured.
pub const TEST: &str = "/test";

/// The route for creating a Plaid Link token.
pub const LINK_TOKEN: &str = "/plaid/link-token";
/// The route for exchanging a public token for an access token.
pub const EXCHANGE_TOKEN: &str = "/plaid/exchange-token";
/// The route for listing the accounts linked to an access token.
pub const ACCOUNTS: &str = "/plaid/accounts";
/// The route for fetching raw transactions from Plaid without storing them.
pub const TRANSACTIONS: &str = "/plaid/transactions";
/// The self-contained Plaid Link HTML page.
pub const LINK_VIEW: &str = "/plaid/link";

/// The route for creating a transaction batch.
pub const CREATE_BATCH: &str = "/plaid/transactions/batch";
/// The route for reading a batch's status.
pub const BATCH_STATUS: &str = "/plaid/transactions/batch/{batch_id}";
/// The route for paging through a batch's transactions.
pub const BATCH_TRANSACTIONS: &str = "/plaid/transactions/batch/{batch_id}/transactions";
/// The route for marking a batch's transactions as processed.
pub const MARK_PROCESSED: &str = "/plaid/transactions/batch/{batch_id}/processed";
/// The route for listing batch summaries.
pub const LIST_BATCHES: &str = "/plaid/transactions/batches";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/plaid/transactions/batch/{batch_id}',
/// '{batch_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: &str) -> String {
    let mut param_start = None;
    let mut param_end = None;

    for (i, c) in endpoint_path.chars().enumerate() {
        if c == '{' {
            param_start = Some(i);
        } else if param_start.is_some() && c == '}' {
            param_end = Some(i + 1);
            break;
        }
    }

    let param_start = match param_start {
        Some(start) => start,
        None => return endpoint_path.to_string(),
    };

    let param_end = param_end.unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}
