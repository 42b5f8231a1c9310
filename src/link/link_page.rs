//! Serves the self-contained Plaid Link HTML page.

use axum::{extract::Query, response::Html};
use serde::Deserialize;

/// The Link page with placeholders for the values the page's JavaScript
/// needs.
const LINK_PAGE_TEMPLATE: &str = include_str!("../../static/link.html");

fn default_environment() -> String {
    "sandbox".to_string()
}

fn default_countries() -> String {
    "US".to_string()
}

/// The query parameters for the Link page.
#[derive(Debug, Deserialize)]
pub struct LinkPageParams {
    /// The Plaid client ID the page should create Link tokens with.
    pub client_id: String,
    /// The environment name, e.g. "sandbox" or "production".
    #[serde(default = "default_environment")]
    pub environment: String,
    /// A comma-separated list of country codes to offer.
    #[serde(default = "default_countries")]
    pub countries: String,
}

/// A route handler that serves the bank-linking page.
///
/// The page is self-contained: it loads the Plaid Link script from Plaid's
/// CDN, requests a Link token from this server, and shows the resulting
/// public token for the user to paste back into Obsidian.
pub async fn get_link_page(Query(params): Query<LinkPageParams>) -> Html<String> {
    let page = LINK_PAGE_TEMPLATE
        .replace("__CLIENT_ID__", &params.client_id)
        .replace("__ENVIRONMENT__", &params.environment)
        .replace("__COUNTRIES__", &params.countries);

    Html(page)
}
