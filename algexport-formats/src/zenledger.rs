//! ZenLedger generalized CSV.
//!
//! ZenLedger types used: `misc_reward`, `fee`, `trade`, `receive`, `send`.

use algexport_core::{AssetScales, CanonicalRecord};
use anyhow::Result;

use crate::format::{Format, Sink, fee_cells, qty_cells, tagged_txid};

pub const NAME: &str = "zenledger";

pub struct ZenLedger;

pub fn new() -> Box<dyn Format> {
    Box::new(ZenLedger)
}

fn kind(record: &CanonicalRecord) -> &'static str {
    if record.reward {
        "misc_reward"
    } else if record.fee_only {
        "fee"
    } else if record.recv_qty != 0 && record.sent_qty != 0 {
        "trade"
    } else if record.recv_qty != 0 {
        "receive"
    } else {
        "send"
    }
}

impl Format for ZenLedger {
    fn name(&self) -> &'static str {
        NAME
    }

    fn write_header(&self, sink: &mut Sink<'_>) -> Result<()> {
        sink.write_record([
            "Timestamp",
            "Type",
            "IN Amount",
            "IN Currency",
            "Out Amount",
            "Out Currency",
            "Fee Amount",
            "Fee Currency",
            "Exchange(optional)",
            "US Based",
            "Txid",
        ])?;
        Ok(())
    }

    fn write_record(&self, sink: &mut Sink<'_>, record: &CanonicalRecord, scales: &AssetScales) -> Result<()> {
        let (recv, recv_cur) = qty_cells(scales, record.recv_qty, record.asset_id)?;
        let (sent, sent_cur) = qty_cells(scales, record.sent_qty, record.asset_id)?;
        let (fee, fee_cur) = fee_cells(record.fee);

        sink.write_record([
            record.block_time.format("%m/%d/%YT%H:%M:%SZ").to_string(),
            kind(record).to_string(),
            recv,
            recv_cur,
            sent,
            sent_cur,
            fee,
            fee_cur,
            "ALGO Wallet".to_string(),
            "Yes".to_string(),
            tagged_txid(record),
        ])?;
        Ok(())
    }
}
