//! Depth-first flattening of inner transactions.

use crate::model::RawTransaction;

/// A transaction lifted out of its nesting, tagged with its top-level id.
#[derive(Debug, Clone, Copy)]
pub struct FlatTransaction<'a> {
    pub tx: &'a RawTransaction,
    /// `None` for top-level transactions.
    pub parent_txid: Option<&'a str>,
}

/// Flatten a page of transactions.
///
/// Inner transactions come before the transaction that spawned them, in their
/// original order, at any depth. Every nested transaction is tagged with the
/// id of the top-level transaction it belongs to.
pub fn flatten(txns: &[RawTransaction]) -> Vec<FlatTransaction<'_>> {
    let mut out = Vec::with_capacity(txns.len());
    walk(txns, None, &mut out);
    out
}

fn walk<'a>(txns: &'a [RawTransaction], root: Option<&'a str>, out: &mut Vec<FlatTransaction<'a>>) {
    for tx in txns {
        if !tx.inner_txns.is_empty() {
            walk(&tx.inner_txns, Some(root.unwrap_or(tx.id.as_str())), out);
        }
        out.push(FlatTransaction {
            tx,
            parent_txid: root,
        });
    }
}
