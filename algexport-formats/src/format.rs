//! The renderer capability and the name -> factory registry.

use algexport_core::decimal::NATIVE_UNIT;
use algexport_core::{AssetScales, CanonicalRecord, format_native};
use anyhow::Result;
use std::collections::BTreeMap;
use std::io;

/// CSV destination a renderer writes into.
pub type Sink<'a> = csv::Writer<&'a mut dyn io::Write>;

pub fn sink(out: &mut dyn io::Write) -> Sink<'_> {
    csv::WriterBuilder::new().from_writer(out)
}

/// A destination tax-tool format.
pub trait Format {
    fn name(&self) -> &'static str;

    fn write_header(&self, sink: &mut Sink<'_>) -> Result<()>;

    fn write_record(&self, sink: &mut Sink<'_>, record: &CanonicalRecord, scales: &AssetScales) -> Result<()>;
}

pub type FormatFactory = fn() -> Box<dyn Format>;

/// Formats known to this process, keyed by name.
#[derive(Default)]
pub struct FormatRegistry {
    factories: BTreeMap<&'static str, FormatFactory>,
}

impl FormatRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: &'static str, factory: FormatFactory) {
        self.factories.insert(name, factory);
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        self.factories.keys().copied().collect()
    }

    pub fn create(&self, name: &str) -> Option<Box<dyn Format>> {
        self.factories.get(name).map(|factory| factory())
    }
}

/// `(amount, currency)`, or two empty cells when the quantity is zero.
pub(crate) fn qty_cells(scales: &AssetScales, qty: u64, asset_id: u64) -> Result<(String, String)> {
    if qty == 0 {
        return Ok((String::new(), String::new()));
    }
    Ok((scales.scale_amount(qty, asset_id)?, scales.currency(asset_id)?))
}

/// Fees are always paid in the native asset.
pub(crate) fn fee_cells(fee: u64) -> (String, String) {
    if fee == 0 {
        return (String::new(), String::new());
    }
    (format_native(fee), NATIVE_UNIT.to_string())
}

/// `<txid>_<first 10 chars of account>` with a `_reward` / `_fee` suffix,
/// unique per record kind within a transaction.
pub(crate) fn tagged_txid(record: &CanonicalRecord) -> String {
    let account = record.account.get(..10).unwrap_or(&record.account);
    let mut id = format!("{}_{}", record.display_txid(), account);
    if record.reward {
        id.push_str("_reward");
    } else if record.fee_only {
        id.push_str("_fee");
    }
    id
}
