//! Transaction batch management for the proxy.
//!
//! This module contains everything related to ingested transaction batches:
//! - The `Batch` and `StoredTransaction` models and their tables
//! - The deduplicating ingestor that turns a Plaid fetch into a batch
//! - The tracker that applies processed flags and recomputes batch status
//! - Paginated, filterable queries over batches and their transactions
//! - The JSON route handlers for the batch endpoints

mod batch_status_endpoint;
mod batch_transactions_endpoint;
mod core;
mod create_batch_endpoint;
mod ingest;
mod list_batches_endpoint;
mod mark_processed_endpoint;
mod query;
mod tracker;

pub use batch_status_endpoint::batch_status_endpoint;
pub use batch_transactions_endpoint::batch_transactions_endpoint;
pub use core::{Batch, BatchStatus, StoredTransaction, create_batch_tables};
pub use create_batch_endpoint::create_batch_endpoint;
pub use ingest::{IngestOutcome, ingest_batch};
pub use list_batches_endpoint::list_batches_endpoint;
pub use mark_processed_endpoint::mark_processed_endpoint;
pub use query::{BatchSummary, list_batches, list_transactions};
pub use tracker::{MarkOutcome, MarkPolicy, mark_processed};
