//! This module defines the common functionality for paging data.

/// The config for pagination
#[derive(Debug, Clone)]
pub struct PaginationConfig {
    /// The number of transactions to return per page when the request does
    /// not specify a limit.
    pub default_limit: u64,
    /// The number of batch summaries to return when the request does not
    /// specify a limit.
    pub default_batch_limit: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_limit: 50,
            default_batch_limit: 20,
        }
    }
}
