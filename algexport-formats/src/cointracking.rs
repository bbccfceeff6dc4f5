//! CoinTracking.info custom CSV import (with the optional Tx-ID column).

use algexport_core::{AssetScales, CanonicalRecord};
use anyhow::Result;

use crate::format::{Format, Sink, fee_cells, qty_cells, tagged_txid};

pub const NAME: &str = "cointracking";

const EXCHANGE: &str = "ALGO Wallet";

pub struct CoinTracking;

pub fn new() -> Box<dyn Format> {
    Box::new(CoinTracking)
}

fn kind(record: &CanonicalRecord) -> &'static str {
    match record {
        r if r.reward => "Reward / Bonus",
        r if r.fee_only => "Withdrawal",
        r if r.recv_qty != 0 && r.sent_qty != 0 => "Trade",
        r if r.recv_qty != 0 => "Deposit",
        _ => "Withdrawal",
    }
}

impl Format for CoinTracking {
    fn name(&self) -> &'static str {
        NAME
    }

    fn write_header(&self, sink: &mut Sink<'_>) -> Result<()> {
        sink.write_record([
            "Type",
            "Buy Amount",
            "Buy Currency",
            "Sell Amount",
            "Sell Currency",
            "Fee",
            "Fee Currency",
            "Exchange",
            "Trade-Group",
            "Comment",
            "Date",
            "Tx-ID",
        ])?;
        Ok(())
    }

    fn write_record(&self, sink: &mut Sink<'_>, record: &CanonicalRecord, scales: &AssetScales) -> Result<()> {
        let (buy, buy_cur) = qty_cells(scales, record.recv_qty, record.asset_id)?;
        let (sell, sell_cur) = qty_cells(scales, record.sent_qty, record.asset_id)?;
        let (fee, fee_cur) = fee_cells(record.fee);

        sink.write_record([
            kind(record).to_string(),
            buy,
            buy_cur,
            sell,
            sell_cur,
            fee,
            fee_cur,
            EXCHANGE.to_string(),
            record.account.clone(),
            scales.describe(record.asset_id),
            record.block_time.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
            tagged_txid(record),
        ])?;
        Ok(())
    }
}
