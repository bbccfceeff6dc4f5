//! algexport-formats: CSV renderers for tax tools, plus the format registry.
//!
//! Renderers are pure formatting over already-normalized records. They must
//! not assume records arrive sorted by time.

pub mod cointracker;
pub mod cointracking;
pub mod format;
pub mod koinly;
pub mod tokentax;
pub mod zenledger;

pub use format::{Format, FormatFactory, FormatRegistry, Sink, sink};

/// Register every built-in format with `registry`.
pub fn register_builtin(registry: &mut FormatRegistry) {
    registry.register(koinly::NAME, koinly::new);
    registry.register(cointracker::NAME, cointracker::new);
    registry.register(cointracking::NAME, cointracking::new);
    registry.register(zenledger::NAME, zenledger::new);
    registry.register(tokentax::NAME, tokentax::new);
}
