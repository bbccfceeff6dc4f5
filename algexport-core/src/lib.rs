//! algexport-core: ledger transaction model, normalization engine and asset scaling.
//!
//! Everything in this crate is pure. Network access lives behind [`LedgerQuery`],
//! implemented by `algexport-indexer`.

pub mod decimal;
pub mod error;
pub mod flatten;
pub mod ledger;
pub mod model;
pub mod normalize;
pub mod record;

pub use decimal::{AssetInfo, AssetScales, NATIVE_ASSET_ID, NATIVE_DECIMALS, format_native};
pub use error::{NormalizeError, ScaleError};
pub use flatten::{FlatTransaction, flatten};
pub use ledger::{LedgerQuery, TransactionPage};
pub use model::{AssetFreezeFields, AssetTransferFields, PaymentFields, RawTransaction, Transfer, TxKind};
pub use normalize::normalize;
pub use record::{CanonicalRecord, push_filtered};
