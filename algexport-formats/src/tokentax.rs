//! TokenTax CSV.
//!
//! Every record is a Deposit, Withdrawal or Staking entry. Outgoing transfers
//! to wallets the user does not own will usually need reclassifying as Spend
//! inside TokenTax. A record with both sides set is a trade, which this
//! exporter does not model, and is rejected.

use algexport_core::{AssetScales, CanonicalRecord};
use anyhow::{Result, bail};

use crate::format::{Format, Sink, fee_cells, qty_cells};

pub const NAME: &str = "tokentax";

pub struct TokenTax;

pub fn new() -> Box<dyn Format> {
    Box::new(TokenTax)
}

impl Format for TokenTax {
    fn name(&self) -> &'static str {
        NAME
    }

    fn write_header(&self, sink: &mut Sink<'_>) -> Result<()> {
        sink.write_record([
            "Type",
            "BuyAmount",
            "BuyCurrency",
            "SellAmount",
            "SellCurrency",
            "FeeAmount",
            "FeeCurrency",
            "Exchange",
            "Group",
            "Comment",
            "Date",
        ])?;
        Ok(())
    }

    fn write_record(&self, sink: &mut Sink<'_>, record: &CanonicalRecord, scales: &AssetScales) -> Result<()> {
        if record.recv_qty != 0 && record.sent_qty != 0 {
            bail!(
                "transaction {} has both buy and sell quantities; trades are not supported",
                record.display_txid()
            );
        }

        let kind = if record.reward {
            "Staking"
        } else if record.recv_qty != 0 {
            "Deposit"
        } else {
            "Withdrawal"
        };
        let (buy, buy_cur) = qty_cells(scales, record.recv_qty, record.asset_id)?;
        let (sell, sell_cur) = qty_cells(scales, record.sent_qty, record.asset_id)?;
        let (fee, fee_cur) = fee_cells(record.fee);

        sink.write_record([
            kind.to_string(),
            buy,
            buy_cur,
            sell,
            sell_cur,
            fee,
            fee_cur,
            String::new(),
            String::new(),
            String::new(),
            record.block_time.format("%m/%d/%Y %H:%M UTC").to_string(),
        ])?;
        Ok(())
    }
}
