//! Raw ledger transactions as returned by an Algorand indexer (v2 JSON).
//!
//! Field names follow the indexer's kebab-case wire format so pages can be
//! decoded straight into these types. Every field is optional on the wire;
//! absent numbers decode as zero and absent payloads as `None`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::NormalizeError;

/// One ledger transaction, possibly carrying nested inner transactions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RawTransaction {
    /// Transaction id. Inner transactions have none.
    pub id: String,
    pub sender: String,
    pub confirmed_round: u64,
    /// Block timestamp, seconds since the unix epoch.
    pub round_time: i64,
    /// Wire name of the transaction kind (`pay`, `axfer`, ...).
    pub tx_type: String,
    /// Fee in microalgos.
    pub fee: u64,
    pub sender_rewards: u64,
    pub receiver_rewards: u64,
    pub close_rewards: u64,
    /// Amount moved to the close-to address of a payment.
    pub closing_amount: u64,
    pub payment_transaction: Option<PaymentFields>,
    pub asset_transfer_transaction: Option<AssetTransferFields>,
    pub asset_freeze_transaction: Option<AssetFreezeFields>,
    pub inner_txns: Vec<RawTransaction>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PaymentFields {
    pub receiver: String,
    pub amount: u64,
    pub close_remainder_to: Option<String>,
    pub close_amount: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct AssetTransferFields {
    pub asset_id: u64,
    pub receiver: String,
    pub amount: u64,
    pub close_to: Option<String>,
    pub close_amount: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct AssetFreezeFields {
    /// Account whose holding is frozen or unfrozen.
    pub address: String,
    pub asset_id: u64,
    pub new_freeze_status: bool,
}

/// Transaction kinds the engine knows how to classify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TxKind {
    Payment,
    AssetTransfer,
    KeyRegistration,
    AssetConfig,
    AssetFreeze,
    ApplicationCall,
}

impl TxKind {
    pub fn parse(wire: &str) -> Option<Self> {
        match wire {
            "pay" => Some(TxKind::Payment),
            "axfer" => Some(TxKind::AssetTransfer),
            "keyreg" => Some(TxKind::KeyRegistration),
            "acfg" => Some(TxKind::AssetConfig),
            "afrz" => Some(TxKind::AssetFreeze),
            "appl" => Some(TxKind::ApplicationCall),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TxKind::Payment => "pay",
            TxKind::AssetTransfer => "axfer",
            TxKind::KeyRegistration => "keyreg",
            TxKind::AssetConfig => "acfg",
            TxKind::AssetFreeze => "afrz",
            TxKind::ApplicationCall => "appl",
        }
    }

    /// Payments and asset transfers move quantity; everything else only costs a fee.
    pub fn moves_value(&self) -> bool {
        matches!(self, TxKind::Payment | TxKind::AssetTransfer)
    }
}

/// Uniform view over the payment and asset-transfer payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transfer<'a> {
    /// 0 for the native asset.
    pub asset_id: u64,
    pub receiver: &'a str,
    pub amount: u64,
    pub close_to: Option<&'a str>,
    pub close_amount: u64,
}

impl RawTransaction {
    pub fn kind(&self) -> Result<TxKind, NormalizeError> {
        TxKind::parse(&self.tx_type).ok_or_else(|| NormalizeError::UnknownKind {
            txid: self.id.clone(),
            kind: self.tx_type.clone(),
        })
    }

    pub fn block_time(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.round_time, 0).unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    }

    /// Quantity-moving payload for `pay` / `axfer`, whichever applies.
    ///
    /// For payments the close quantity comes from the payload when the indexer
    /// fills it, otherwise from the top-level `closing-amount`.
    pub fn transfer(&self) -> Option<Transfer<'_>> {
        match TxKind::parse(&self.tx_type)? {
            TxKind::Payment => {
                let p = self.payment_transaction.as_ref()?;
                let close_amount = if p.close_amount != 0 {
                    p.close_amount
                } else {
                    self.closing_amount
                };
                Some(Transfer {
                    asset_id: 0,
                    receiver: &p.receiver,
                    amount: p.amount,
                    close_to: non_empty(p.close_remainder_to.as_deref()),
                    close_amount,
                })
            }
            TxKind::AssetTransfer => {
                let a = self.asset_transfer_transaction.as_ref()?;
                Some(Transfer {
                    asset_id: a.asset_id,
                    receiver: &a.receiver,
                    amount: a.amount,
                    close_to: non_empty(a.close_to.as_deref()),
                    close_amount: a.close_amount,
                })
            }
            _ => None,
        }
    }

    /// Address in a receiver-like role for kinds that move no value.
    pub fn receiver_role(&self) -> Option<&str> {
        match TxKind::parse(&self.tx_type)? {
            TxKind::AssetFreeze => non_empty(
                self.asset_freeze_transaction
                    .as_ref()
                    .map(|f| f.address.as_str()),
            ),
            _ => None,
        }
    }

    /// Asset id of an asset transfer, if this is one.
    pub fn transferred_asset(&self) -> Option<u64> {
        self.asset_transfer_transaction
            .as_ref()
            .map(|a| a.asset_id)
            .filter(|id| *id != 0)
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.is_empty())
}
