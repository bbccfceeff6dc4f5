//! Koinly universal CSV.

use algexport_core::{AssetScales, CanonicalRecord};
use anyhow::Result;

use crate::format::{Format, Sink, fee_cells, qty_cells};

pub const NAME: &str = "koinly";

const HEADER: [&str; 12] = [
    "Date",
    "Sent Amount",
    "Sent Currency",
    "Received Amount",
    "Received Currency",
    "Fee Amount",
    "Fee Currency",
    "Net Worth Amount",
    "Net Worth Currency",
    "Label",
    "Description",
    "TxHash",
];

pub struct Koinly;

pub fn new() -> Box<dyn Format> {
    Box::new(Koinly)
}

impl Format for Koinly {
    fn name(&self) -> &'static str {
        NAME
    }

    fn write_header(&self, sink: &mut Sink<'_>) -> Result<()> {
        sink.write_record(HEADER)?;
        Ok(())
    }

    fn write_record(&self, sink: &mut Sink<'_>, record: &CanonicalRecord, scales: &AssetScales) -> Result<()> {
        let (sent, sent_cur) = qty_cells(scales, record.sent_qty, record.asset_id)?;
        let (recv, recv_cur) = qty_cells(scales, record.recv_qty, record.asset_id)?;
        let (fee, fee_cur) = fee_cells(record.fee);

        // Koinly dedups on TxHash, so a reward needs its own.
        let (label, tx_hash) = if record.reward {
            ("staking", format!("reward-{}", record.display_txid()))
        } else {
            ("", record.display_txid().to_string())
        };

        sink.write_record([
            record.block_time.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            sent,
            sent_cur,
            recv,
            recv_cur,
            fee,
            fee_cur,
            String::new(),
            String::new(),
            label.to_string(),
            String::new(),
            tx_hash,
        ])?;
        Ok(())
    }
}
