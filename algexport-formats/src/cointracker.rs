//! CoinTracker CSV. Only a tag column is available for classification.

use algexport_core::{AssetScales, CanonicalRecord};
use anyhow::Result;

use crate::format::{Format, Sink, fee_cells, qty_cells};

pub const NAME: &str = "cointracker";

pub struct CoinTracker;

pub fn new() -> Box<dyn Format> {
    Box::new(CoinTracker)
}

impl Format for CoinTracker {
    fn name(&self) -> &'static str {
        NAME
    }

    fn write_header(&self, sink: &mut Sink<'_>) -> Result<()> {
        sink.write_record([
            "Date",
            "Received Quantity",
            "Received Currency",
            "Sent Quantity",
            "Sent Currency",
            "Fee Amount",
            "Fee Currency",
            "Tag",
        ])?;
        Ok(())
    }

    fn write_record(&self, sink: &mut Sink<'_>, record: &CanonicalRecord, scales: &AssetScales) -> Result<()> {
        let (recv, recv_cur) = qty_cells(scales, record.recv_qty, record.asset_id)?;
        let (sent, sent_cur) = qty_cells(scales, record.sent_qty, record.asset_id)?;
        let (fee, fee_cur) = fee_cells(record.fee);
        let tag = if record.reward { "staked" } else { "" };

        sink.write_record([
            record.block_time.format("%m/%d/%Y %H:%M:%S").to_string(),
            recv,
            recv_cur,
            sent,
            sent_cur,
            fee,
            fee_cur,
            tag.to_string(),
        ])?;
        Ok(())
    }
}
