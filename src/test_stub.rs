//! Shared test doubles for the Plaid API boundary.

use async_trait::async_trait;
use serde_json::json;
use time::Date;

use crate::{
    Error,
    plaid::{
        AccountsData, ExchangeTokenData, LinkTokenData, PlaidApi, RawTransaction,
        ResolvedCredentials, TransactionsFetch,
    },
};

/// A [PlaidApi] implementation that serves canned data without touching the
/// network.
#[derive(Debug, Clone)]
pub(crate) struct StubPlaid {
    transactions: Vec<RawTransaction>,
    error_code: Option<String>,
}

impl StubPlaid {
    /// A stub whose transaction fetches return `transactions`.
    pub(crate) fn with_transactions(transactions: Vec<RawTransaction>) -> Self {
        Self {
            transactions,
            error_code: None,
        }
    }

    /// A stub whose every call fails with a provider error carrying
    /// `error_code`.
    pub(crate) fn failing(error_code: &str) -> Self {
        Self {
            transactions: Vec::new(),
            error_code: Some(error_code.to_string()),
        }
    }

    fn check_failure(&self) -> Result<(), Error> {
        match &self.error_code {
            Some(code) => Err(Error::Provider(format!(
                "Plaid API Error (ITEM_ERROR/{code}): stub failure"
            ))),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl PlaidApi for StubPlaid {
    async fn create_link_token(
        &self,
        _credentials: &ResolvedCredentials,
        _user_id: &str,
        _country_codes: &[String],
    ) -> Result<LinkTokenData, Error> {
        self.check_failure()?;

        Ok(LinkTokenData {
            link_token: "link-sandbox-stub-token".to_string(),
            expiration: Some("2024-01-01T12:30:00Z".to_string()),
        })
    }

    async fn exchange_public_token(
        &self,
        _credentials: &ResolvedCredentials,
        public_token: &str,
    ) -> Result<ExchangeTokenData, Error> {
        self.check_failure()?;

        Ok(ExchangeTokenData {
            access_token: format!("access-sandbox-{public_token}"),
            item_id: "item-stub-1".to_string(),
        })
    }

    async fn get_accounts(
        &self,
        _credentials: &ResolvedCredentials,
        _access_token: &str,
    ) -> Result<AccountsData, Error> {
        self.check_failure()?;

        Ok(AccountsData {
            accounts: json!([{ "account_id": "account-stub-1", "name": "Checking" }]),
            item: json!({ "item_id": "item-stub-1" }),
        })
    }

    async fn fetch_transactions(
        &self,
        _credentials: &ResolvedCredentials,
        _access_token: &str,
        _start_date: Date,
        _end_date: Date,
    ) -> Result<TransactionsFetch, Error> {
        self.check_failure()?;

        Ok(TransactionsFetch {
            transactions: self.transactions.clone(),
            accounts: json!([]),
            total_transactions: self.transactions.len() as u64,
            item: json!({ "item_id": "item-stub-1" }),
        })
    }
}
