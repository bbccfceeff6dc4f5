//! Canonical accounting records and the post-filter applied before emission.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A single send / receive / fee / reward event, relative to one observer account.
///
/// Quantities are in minor units of `asset_id` (fees are always native).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CanonicalRecord {
    pub block_time: DateTime<Utc>,
    /// Top-level transaction id when this record comes from an inner transaction.
    pub parent_txid: Option<String>,
    pub txid: String,
    pub recv_qty: u64,
    pub sent_qty: u64,
    pub fee: u64,
    /// 0 for the native asset.
    pub asset_id: u64,
    /// Observer account the record is relative to.
    pub account: String,
    pub sender: String,
    pub receiver: String,
    /// Protocol reward, to be treated as income.
    pub reward: bool,
    /// Only a fee was paid; no quantity moved.
    pub fee_only: bool,
}

impl CanonicalRecord {
    pub fn is_noop(&self) -> bool {
        self.recv_qty == 0 && self.sent_qty == 0 && self.fee == 0
    }

    /// Id a tax tool should see: the outer transaction for inner records.
    pub fn display_txid(&self) -> &str {
        self.parent_txid.as_deref().unwrap_or(&self.txid)
    }

    /// Collapse a simultaneous send and receive into a single net quantity.
    fn net_self_transfer(&mut self) {
        if self.sent_qty == 0 || self.recv_qty == 0 {
            return;
        }
        if self.sent_qty >= self.recv_qty {
            self.sent_qty -= self.recv_qty;
            self.recv_qty = 0;
        } else {
            self.recv_qty -= self.sent_qty;
            self.sent_qty = 0;
        }
    }
}

/// Net the record, then append it unless nothing was sent, received or paid.
pub fn push_filtered(records: &mut Vec<CanonicalRecord>, mut record: CanonicalRecord) {
    record.net_self_transfer();
    if record.is_noop() {
        return;
    }
    records.push(record);
}
