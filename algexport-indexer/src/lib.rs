//! algexport-indexer: Algorand indexer v2 REST client implementing `LedgerQuery`.

pub mod client;
pub mod wire;

pub use client::{DEFAULT_API_KEY_HEADER, DEFAULT_INDEXER_URL, IndexerClient, IndexerConfig};
