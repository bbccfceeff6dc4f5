//! The ledger query collaborator.

use serde::Deserialize;

use crate::decimal::AssetInfo;
use crate::model::RawTransaction;

/// One page of an account's transaction history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct TransactionPage {
    /// Latest round the ledger service had seen when answering.
    pub current_round: u64,
    pub next_token: Option<String>,
    pub transactions: Vec<RawTransaction>,
}

/// Read access to ledger history and asset metadata.
///
/// Implementations do not retry; a failed call aborts the caller's run.
#[allow(async_fn_in_trait)]
pub trait LedgerQuery {
    /// Transactions touching `account` with round >= `min_round`.
    async fn account_transactions(
        &self,
        account: &str,
        min_round: u64,
        next_token: Option<&str>,
    ) -> anyhow::Result<TransactionPage>;

    async fn asset_info(&self, asset_id: u64) -> anyhow::Result<AssetInfo>;
}
