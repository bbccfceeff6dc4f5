//! Typed errors for the engine and the asset scale table.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    #[error("unknown transaction type '{kind}' in transaction '{txid}'")]
    UnknownKind { txid: String, kind: String },

    #[error("transaction '{txid}' of type '{kind}' carries no transfer payload")]
    MissingPayload { txid: String, kind: &'static str },

    #[error("quantities in transaction '{txid}' overflow 64 bits")]
    AmountOverflow { txid: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScaleError {
    #[error("unknown decimal scale for asset id {0}")]
    UnknownAsset(u64),

    #[error("asset id {asset_id} reports {decimals} decimals (expected 0..=19)")]
    DecimalsOutOfRange { asset_id: u64, decimals: u32 },
}
