//! Normalization engine: one raw transaction + observer account -> canonical records.
//!
//! Fees belong to whoever paid them, so a purely incoming transfer never
//! carries the fee. Rewards are split into their own record, dated one second
//! before the transaction so a chronological balance replay never dips below
//! zero when the rewarded balance is spent in the same transaction.
//!
//! A close-to address that differs from the receiver is exported as two
//! sends; the primary one is dated one second later and carries the fee.

use chrono::{DateTime, Duration, Utc};

use crate::decimal::NATIVE_ASSET_ID;
use crate::error::NormalizeError;
use crate::model::{RawTransaction, Transfer, TxKind};
use crate::record::{CanonicalRecord, push_filtered};

/// Classify `tx` from the point of view of `observer`.
///
/// `parent_txid` is the top-level transaction id when `tx` is an inner
/// transaction. The output is already post-filtered.
pub fn normalize(
    tx: &RawTransaction,
    parent_txid: Option<&str>,
    observer: &str,
) -> Result<Vec<CanonicalRecord>, NormalizeError> {
    let kind = tx.kind()?;
    let ctx = Context {
        tx,
        parent_txid,
        observer,
        time: tx.block_time(),
    };

    let mut records = Vec::new();
    let rewards = if kind.moves_value() {
        let transfer = tx.transfer().ok_or_else(|| NormalizeError::MissingPayload {
            txid: tx.id.clone(),
            kind: kind.as_str(),
        })?;
        ctx.transfer_records(&transfer, &mut records)?
    } else {
        ctx.fee_records(&mut records)?
    };

    if rewards != 0 {
        push_filtered(
            &mut records,
            CanonicalRecord {
                block_time: ctx.time - Duration::seconds(1),
                recv_qty: rewards,
                asset_id: NATIVE_ASSET_ID,
                receiver: observer.to_string(),
                reward: true,
                ..ctx.blank()
            },
        );
    }

    Ok(records)
}

struct Context<'a> {
    tx: &'a RawTransaction,
    parent_txid: Option<&'a str>,
    observer: &'a str,
    time: DateTime<Utc>,
}

impl Context<'_> {
    fn blank(&self) -> CanonicalRecord {
        CanonicalRecord {
            block_time: self.time,
            parent_txid: self.parent_txid.map(str::to_string),
            txid: self.tx.id.clone(),
            recv_qty: 0,
            sent_qty: 0,
            fee: 0,
            asset_id: NATIVE_ASSET_ID,
            account: self.observer.to_string(),
            sender: String::new(),
            receiver: String::new(),
            reward: false,
            fee_only: false,
        }
    }

    /// Sum of wire-supplied quantities; overflow means the input is corrupt.
    fn sum(&self, parts: &[u64]) -> Result<u64, NormalizeError> {
        parts
            .iter()
            .try_fold(0u64, |acc, &n| acc.checked_add(n))
            .ok_or_else(|| NormalizeError::AmountOverflow {
                txid: self.tx.id.clone(),
            })
    }

    /// Payment and asset-transfer classification. Returns accrued rewards.
    fn transfer_records(&self, t: &Transfer<'_>, out: &mut Vec<CanonicalRecord>) -> Result<u64, NormalizeError> {
        let tx = self.tx;
        let is_sender = tx.sender == self.observer;
        let is_receiver = t.receiver == self.observer;
        let is_close_to = t.close_to == Some(self.observer);

        if is_receiver || is_close_to {
            let mut recv = 0;
            let mut sent = 0;
            let mut rewards = 0;

            // Receiver and close-to can both match.
            if is_receiver {
                recv = self.sum(&[recv, t.amount])?;
                rewards = self.sum(&[rewards, tx.receiver_rewards])?;
            }
            if is_close_to {
                recv = self.sum(&[recv, t.close_amount])?;
                rewards = self.sum(&[rewards, tx.close_rewards])?;
            }
            if is_sender {
                sent = t.amount;
                if t.close_to.is_some() && !is_close_to {
                    sent = self.sum(&[sent, t.close_amount])?;
                }
                rewards = self.sum(&[rewards, tx.sender_rewards])?;
            }

            push_filtered(
                out,
                CanonicalRecord {
                    recv_qty: recv,
                    sent_qty: sent,
                    fee: if is_sender { tx.fee } else { 0 },
                    asset_id: t.asset_id,
                    sender: tx.sender.clone(),
                    receiver: self.observer.to_string(),
                    ..self.blank()
                },
            );
            return Ok(rewards);
        }

        if !is_sender {
            return Ok(0);
        }

        match t.close_to {
            Some(close_to) if close_to != t.receiver => {
                push_filtered(
                    out,
                    CanonicalRecord {
                        sent_qty: t.close_amount,
                        asset_id: t.asset_id,
                        sender: self.observer.to_string(),
                        receiver: close_to.to_string(),
                        ..self.blank()
                    },
                );
                push_filtered(
                    out,
                    CanonicalRecord {
                        block_time: self.time + Duration::seconds(1),
                        sent_qty: t.amount,
                        fee: tx.fee,
                        asset_id: t.asset_id,
                        sender: self.observer.to_string(),
                        receiver: t.receiver.to_string(),
                        ..self.blank()
                    },
                );
            }
            _ => {
                push_filtered(
                    out,
                    CanonicalRecord {
                        sent_qty: self.sum(&[t.amount, t.close_amount])?,
                        fee: tx.fee,
                        asset_id: t.asset_id,
                        sender: self.observer.to_string(),
                        receiver: t.receiver.to_string(),
                        ..self.blank()
                    },
                );
            }
        }
        Ok(tx.sender_rewards)
    }

    /// Kinds that move no value: only the fee and rewards matter.
    fn fee_records(&self, out: &mut Vec<CanonicalRecord>) -> Result<u64, NormalizeError> {
        let tx = self.tx;
        let mut rewards = 0;

        if tx.receiver_role() == Some(self.observer) {
            rewards = tx.receiver_rewards;
        }
        if tx.sender == self.observer {
            push_filtered(
                out,
                CanonicalRecord {
                    fee: tx.fee,
                    sender: self.observer.to_string(),
                    fee_only: true,
                    ..self.blank()
                },
            );
            rewards = self.sum(&[rewards, tx.sender_rewards])?;
        }
        Ok(rewards)
    }
}
