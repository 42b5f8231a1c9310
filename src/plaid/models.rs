//! Data models for the Plaid API boundary: environments, credentials, and
//! the opaque transaction record wrapper.

use std::env;

use serde::{Deserialize, Serialize};

use crate::Error;

/// The Plaid environment a request should be sent to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaidEnvironment {
    /// The Plaid sandbox environment for testing with fake institutions.
    #[default]
    Sandbox,
    /// The live Plaid environment.
    Production,
}

impl PlaidEnvironment {
    /// Map an environment name to a [PlaidEnvironment].
    ///
    /// Unrecognized names fall back to the sandbox so a typo cannot
    /// accidentally hit the live environment.
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "production" => Self::Production,
            _ => Self::Sandbox,
        }
    }

    /// The base URL for this environment's REST API.
    pub fn base_url(self) -> &'static str {
        match self {
            Self::Sandbox => "https://sandbox.plaid.com",
            Self::Production => "https://production.plaid.com",
        }
    }

    /// The lowercase name of the environment.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sandbox => "sandbox",
            Self::Production => "production",
        }
    }
}

/// Server-side Plaid configuration loaded from the environment.
///
/// Requests may carry their own credentials; empty request fields fall back
/// to these values.
#[derive(Debug, Clone, Default)]
pub struct ProviderConfig {
    /// The Plaid client ID from `PLAID_CLIENT_ID`.
    pub client_id: Option<String>,
    /// The Plaid secret from `PLAID_SECRET`.
    pub secret: Option<String>,
    /// The default environment from `PLAID_ENV`.
    pub environment: PlaidEnvironment,
}

impl ProviderConfig {
    /// Load the provider configuration from the process environment.
    pub fn from_env() -> Self {
        Self {
            client_id: env::var("PLAID_CLIENT_ID").ok().filter(|id| !id.is_empty()),
            secret: env::var("PLAID_SECRET").ok().filter(|s| !s.is_empty()),
            environment: PlaidEnvironment::from_name(
                &env::var("PLAID_ENV").unwrap_or_default(),
            ),
        }
    }

    /// Whether both the client ID and secret are set.
    pub fn is_configured(&self) -> bool {
        self.client_id.is_some() && self.secret.is_some()
    }
}

/// Plaid credentials as they appear in request bodies.
///
/// Empty fields mean "use the server's environment configuration".
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PlaidCredentials {
    /// The Plaid client ID, or empty to use the environment variable.
    pub client_id: String,
    /// The Plaid secret, or empty to use the environment variable.
    pub secret: String,
    /// The environment name, e.g. "sandbox" or "production".
    pub environment: String,
}

impl PlaidCredentials {
    /// Combine request credentials with the server configuration.
    ///
    /// # Errors
    /// Returns [Error::MissingCredentials] if neither source provides both a
    /// client ID and a secret.
    pub fn resolve(&self, config: &ProviderConfig) -> Result<ResolvedCredentials, Error> {
        let client_id = if self.client_id.is_empty() {
            config.client_id.clone()
        } else {
            Some(self.client_id.clone())
        };
        let secret = if self.secret.is_empty() {
            config.secret.clone()
        } else {
            Some(self.secret.clone())
        };

        let (Some(client_id), Some(secret)) = (client_id, secret) else {
            return Err(Error::MissingCredentials);
        };

        let environment = if self.environment.is_empty() {
            config.environment
        } else {
            PlaidEnvironment::from_name(&self.environment)
        };

        Ok(ResolvedCredentials {
            client_id,
            secret,
            environment,
        })
    }
}

/// Fully resolved credentials ready to be sent to Plaid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCredentials {
    /// The Plaid client ID.
    pub client_id: String,
    /// The Plaid secret.
    pub secret: String,
    /// The environment the credentials belong to.
    pub environment: PlaidEnvironment,
}

/// A transaction record as returned by Plaid, kept as an opaque JSON
/// document.
///
/// The provider payload is heterogeneous and changes between API versions,
/// so apart from the transaction ID no fields are interpreted; the whole
/// record is stored and returned verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawTransaction(serde_json::Value);

impl RawTransaction {
    /// Wrap a raw provider record.
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    /// The provider's unique transaction identifier, if present and
    /// non-empty.
    pub fn transaction_id(&self) -> Option<&str> {
        self.0
            .get("transaction_id")
            .and_then(serde_json::Value::as_str)
            .filter(|id| !id.is_empty())
    }

    /// Serialize the record as a JSON document for storage.
    ///
    /// # Errors
    /// Returns [Error::Conversion] if the record cannot be serialized.
    pub fn to_document(&self) -> Result<String, Error> {
        serde_json::to_string(&self.0).map_err(|error| Error::Conversion(error.to_string()))
    }
}

/// The result of a Plaid `/transactions/get` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionsFetch {
    /// The raw transaction records.
    pub transactions: Vec<RawTransaction>,
    /// The accounts the transactions belong to, passed through opaquely.
    #[serde(default)]
    pub accounts: serde_json::Value,
    /// The total number of transactions Plaid holds for the query range.
    #[serde(default)]
    pub total_transactions: u64,
    /// The Plaid item metadata, passed through opaquely.
    #[serde(default)]
    pub item: serde_json::Value,
}

/// The result of a Plaid `/link/token/create` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkTokenData {
    /// The token the Link widget is initialized with.
    pub link_token: String,
    /// When the link token expires.
    #[serde(default)]
    pub expiration: Option<String>,
}

/// The result of a Plaid `/item/public_token/exchange` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeTokenData {
    /// The long-lived access token for the linked item.
    pub access_token: String,
    /// The ID of the linked item.
    pub item_id: String,
}

/// The result of a Plaid `/accounts/get` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountsData {
    /// The linked accounts, passed through opaquely.
    pub accounts: serde_json::Value,
    /// The Plaid item metadata, passed through opaquely.
    #[serde(default)]
    pub item: serde_json::Value,
}
