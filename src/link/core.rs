//! Shared state for the bank-linking endpoints.

use std::sync::Arc;

use axum::extract::FromRef;

use crate::{
    AppState,
    plaid::{PlaidApi, ProviderConfig},
};

/// The state needed to forward a request to the Plaid API.
#[derive(Clone)]
pub struct PlaidGatewayState {
    /// The client for the upstream Plaid API.
    pub plaid: Arc<dyn PlaidApi>,
    /// The server-side Plaid credentials that requests fall back to.
    pub provider_config: ProviderConfig,
}

impl FromRef<AppState> for PlaidGatewayState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            plaid: state.plaid.clone(),
            provider_config: state.provider_config.clone(),
        }
    }
}
