//! Incremental export driver.
//!
//! Per account: resume from the checkpoint, walk the paginated history,
//! flatten inner transactions, normalize and render one CSV per page. The
//! checkpoint only moves once the account's history is exhausted, so a failed
//! run resumes from the same round. Accounts run strictly one after another.

use algexport_core::{
    AssetInfo, AssetScales, FlatTransaction, LedgerQuery, NormalizeError, TransactionPage, flatten,
    normalize,
};
use algexport_formats::{Format, sink};
use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::UnknownKindPolicy;
use crate::pacer::Pacer;
use crate::state::{ExportState, StateStore};

#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub out_dir: PathBuf,
    pub request_delay: Duration,
    pub on_unknown_kind: UnknownKindPolicy,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportSummary {
    pub accounts: usize,
    pub pages: usize,
    pub records: usize,
    /// Transactions dropped under `UnknownKindPolicy::Skip`.
    pub skipped: usize,
    pub files: Vec<PathBuf>,
}

#[derive(Debug, Default)]
struct PageOutcome {
    records: usize,
    skipped: usize,
}

pub struct Exporter<'a, Q> {
    ledger: &'a Q,
    format: &'a dyn Format,
    options: ExportOptions,
    pacer: Pacer,
    scales: AssetScales,
}

impl<'a, Q: LedgerQuery> Exporter<'a, Q> {
    pub fn new(ledger: &'a Q, format: &'a dyn Format, options: ExportOptions) -> Self {
        Self {
            ledger,
            format,
            pacer: Pacer::new(options.request_delay),
            options,
            scales: AssetScales::new(),
        }
    }

    /// Export every account in order, then flush the checkpoint once more.
    pub async fn run(
        &mut self,
        accounts: &[String],
        state: &mut ExportState,
        store: &StateStore,
    ) -> Result<ExportSummary> {
        fs::create_dir_all(&self.options.out_dir)
            .with_context(|| format!("create {}", self.options.out_dir.display()))?;

        let mut summary = ExportSummary::default();
        for account in accounts {
            self.export_account(account, state, store, &mut summary)
                .await
                .with_context(|| format!("exporting {account}"))?;
            summary.accounts += 1;
        }

        store.save(state)?;
        Ok(summary)
    }

    async fn export_account(
        &mut self,
        account: &str,
        state: &mut ExportState,
        store: &StateStore,
        summary: &mut ExportSummary,
    ) -> Result<()> {
        let format = self.format.name();
        let start_round = state.cursor(format, account).start_round();
        info!(account, start_round, format, "exporting account");

        let mut next_token: Option<String> = None;
        let mut page_no = 1;
        // Held in memory until pagination is exhausted. Page order says
        // nothing about which rounds are covered, so no prefix is safe to save.
        let mut reached_round = 0;
        loop {
            self.pacer.wait().await;
            let page = self
                .ledger
                .account_transactions(account, start_round, next_token.as_deref())
                .await?;
            info!(
                page = page_no,
                transactions = page.transactions.len(),
                current_round = page.current_round,
                "fetched page"
            );
            reached_round = reached_round.max(page.current_round);

            if page.transactions.is_empty() {
                break;
            }

            let path = self.options.out_dir.join(format!(
                "{}-{}-{}-{}-{}.csv",
                format, account, start_round, page.current_round, page_no
            ));
            let outcome = self.write_page(account, &page, &path).await?;

            summary.pages += 1;
            summary.records += outcome.records;
            summary.skipped += outcome.skipped;
            summary.files.push(path);

            match page.next_token.filter(|t| !t.is_empty()) {
                Some(token) => next_token = Some(token),
                None => break,
            }
            page_no += 1;
        }

        state.cursor_mut(format, account).advance(reached_round);
        store.save(state)?;
        info!(account, last_round = reached_round, "account exported");
        Ok(())
    }

    async fn write_page(&mut self, account: &str, page: &TransactionPage, path: &Path) -> Result<PageOutcome> {
        let flat = flatten(&page.transactions);
        self.resolve_assets(&flat).await?;

        let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
        let mut out = BufWriter::new(file);
        let mut csv = sink(&mut out);
        self.format.write_header(&mut csv)?;

        let mut outcome = PageOutcome::default();
        for item in &flat {
            if !item.tx.inner_txns.is_empty() {
                debug!(txid = %item.tx.id, inner = item.tx.inner_txns.len(), "flattened inner transactions");
            }
            let records = match normalize(item.tx, item.parent_txid, account) {
                Ok(records) => records,
                Err(err @ NormalizeError::UnknownKind { .. })
                    if self.options.on_unknown_kind == UnknownKindPolicy::Skip =>
                {
                    warn!(%err, "skipping transaction");
                    outcome.skipped += 1;
                    continue;
                }
                Err(err) => return Err(err.into()),
            };
            for record in &records {
                self.format.write_record(&mut csv, record, &self.scales)?;
            }
            outcome.records += records.len();
        }

        csv.flush().with_context(|| format!("write {}", path.display()))?;
        info!(path = %path.display(), records = outcome.records, "wrote page");
        Ok(outcome)
    }

    /// Fetch decimals for every asset on the page not seen yet this run.
    async fn resolve_assets(&mut self, flat: &[FlatTransaction<'_>]) -> Result<()> {
        for item in flat {
            let Some(asset_id) = item.tx.transferred_asset() else {
                continue;
            };
            if !self.scales.needs_lookup(asset_id) {
                continue;
            }
            self.pacer.wait().await;
            info!(asset_id, "looking up asset");
            let info = self.ledger.asset_info(asset_id).await?;
            self.scales
                .insert(AssetInfo { id: asset_id, ..info })
                .with_context(|| format!("asset id {asset_id}"))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use algexport_core::{AssetTransferFields, PaymentFields, RawTransaction};
    use algexport_formats::{FormatRegistry, register_builtin};
    use anyhow::bail;
    use std::cell::{Cell, RefCell};

    const ME: &str = "ME";

    /// In-memory ledger: every transaction touches `ME`; pages of `page_size`.
    struct FakeLedger {
        txns: Vec<RawTransaction>,
        current_round: u64,
        page_size: usize,
        assets: Vec<AssetInfo>,
        requests: RefCell<Vec<(u64, Option<String>)>>,
        asset_lookups: Cell<usize>,
        fail_on_request: Option<usize>,
    }

    impl FakeLedger {
        fn new(txns: Vec<RawTransaction>, current_round: u64) -> Self {
            Self {
                txns,
                current_round,
                page_size: 100,
                assets: Vec::new(),
                requests: RefCell::new(Vec::new()),
                asset_lookups: Cell::new(0),
                fail_on_request: None,
            }
        }
    }

    impl LedgerQuery for FakeLedger {
        async fn account_transactions(
            &self,
            _account: &str,
            min_round: u64,
            next_token: Option<&str>,
        ) -> Result<TransactionPage> {
            let n = self.requests.borrow().len();
            self.requests
                .borrow_mut()
                .push((min_round, next_token.map(str::to_string)));
            if self.fail_on_request == Some(n) {
                bail!("indexer unavailable");
            }

            let offset: usize = next_token.map(|t| t.parse()).transpose()?.unwrap_or(0);
            let matching: Vec<_> = self
                .txns
                .iter()
                .filter(|t| t.confirmed_round >= min_round && t.confirmed_round <= self.current_round)
                .cloned()
                .collect();
            let transactions: Vec<_> = matching.iter().skip(offset).take(self.page_size).cloned().collect();
            let next = offset + transactions.len();
            Ok(TransactionPage {
                current_round: self.current_round,
                next_token: (!transactions.is_empty()).then(|| next.to_string()),
                transactions,
            })
        }

        async fn asset_info(&self, asset_id: u64) -> Result<AssetInfo> {
            self.asset_lookups.set(self.asset_lookups.get() + 1);
            match self.assets.iter().find(|a| a.id == asset_id) {
                Some(a) => Ok(a.clone()),
                None => bail!("asset {asset_id} not found"),
            }
        }
    }

    fn pay(id: &str, round: u64, sender: &str, receiver: &str, amount: u64) -> RawTransaction {
        RawTransaction {
            id: id.into(),
            sender: sender.into(),
            confirmed_round: round,
            round_time: 1_650_000_000 + round as i64,
            tx_type: "pay".into(),
            fee: 1000,
            payment_transaction: Some(PaymentFields {
                receiver: receiver.into(),
                amount,
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn axfer(id: &str, round: u64, asset_id: u64, amount: u64) -> RawTransaction {
        RawTransaction {
            id: id.into(),
            sender: "ISSUER".into(),
            confirmed_round: round,
            round_time: 1_650_000_000 + round as i64,
            tx_type: "axfer".into(),
            fee: 1000,
            asset_transfer_transaction: Some(AssetTransferFields {
                asset_id,
                receiver: ME.into(),
                amount,
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    struct Harness {
        dir: PathBuf,
        store: StateStore,
        format: Box<dyn Format>,
    }

    impl Harness {
        fn new(name: &str) -> Self {
            let dir = std::env::temp_dir().join(format!("algexport-export-{}-{}", name, std::process::id()));
            let _ = fs::remove_dir_all(&dir);
            let mut registry = FormatRegistry::new();
            register_builtin(&mut registry);
            Self {
                store: StateStore::new(dir.join("state.json")),
                format: registry.create("koinly").unwrap(),
                dir,
            }
        }

        fn options(&self, policy: UnknownKindPolicy) -> ExportOptions {
            ExportOptions {
                out_dir: self.dir.join("out"),
                request_delay: Duration::ZERO,
                on_unknown_kind: policy,
            }
        }

        async fn run(&self, ledger: &FakeLedger, policy: UnknownKindPolicy) -> Result<ExportSummary> {
            let mut state = self.store.load()?;
            let mut exporter = Exporter::new(ledger, self.format.as_ref(), self.options(policy));
            exporter.run(&[ME.to_string()], &mut state, &self.store).await
        }

        fn last_round(&self) -> u64 {
            self.store.load().unwrap().cursor("koinly", ME).last_round
        }

        fn out_files(&self) -> Vec<String> {
            let mut names: Vec<_> = fs::read_dir(self.dir.join("out"))
                .unwrap()
                .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
                .collect();
            names.sort();
            names
        }
    }

    #[tokio::test]
    async fn test_pages_become_files_and_checkpoint_advances() {
        let h = Harness::new("pages");
        let mut ledger = FakeLedger::new(
            vec![
                pay("T1", 10, "ALICE", ME, 1_000_000),
                pay("T2", 11, ME, "BOB", 500_000),
                pay("T3", 12, "ALICE", ME, 2_000_000),
            ],
            20,
        );
        ledger.page_size = 2;

        let summary = h.run(&ledger, UnknownKindPolicy::Fail).await.unwrap();
        assert_eq!(summary.accounts, 1);
        assert_eq!(summary.pages, 2);
        assert_eq!(summary.records, 3);
        assert_eq!(h.out_files(), ["koinly-ME-1-20-1.csv", "koinly-ME-1-20-2.csv"]);
        assert_eq!(h.last_round(), 20);

        let first = fs::read_to_string(h.dir.join("out/koinly-ME-1-20-1.csv")).unwrap();
        let lines: Vec<_> = first.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Date,"));
        assert!(lines[1].ends_with(",1.000000,ALGO,,,,,,,T1"));
        assert!(lines[2].contains(",0.500000,ALGO,,,0.001000,ALGO,"));

        // Every page after the first continues from the previous token.
        let requests = ledger.requests.borrow();
        assert_eq!(requests[0], (1, None));
        assert_eq!(requests[1], (1, Some("2".to_string())));
    }

    #[tokio::test]
    async fn test_rerun_without_new_data_is_a_no_op() {
        let h = Harness::new("rerun");
        let ledger = FakeLedger::new(vec![pay("T1", 10, "ALICE", ME, 1_000_000)], 20);

        h.run(&ledger, UnknownKindPolicy::Fail).await.unwrap();
        let files_before = h.out_files();
        let state_before = fs::read_to_string(h.store.path()).unwrap();

        let second = FakeLedger::new(ledger.txns.clone(), 20);
        let summary = h.run(&second, UnknownKindPolicy::Fail).await.unwrap();

        assert_eq!(summary.pages, 0);
        assert!(summary.files.is_empty());
        assert_eq!(h.out_files(), files_before);
        assert_eq!(fs::read_to_string(h.store.path()).unwrap(), state_before);
        // Resume excludes the already-processed round.
        assert_eq!(second.requests.borrow()[0].0, 21);
    }

    #[tokio::test]
    async fn test_resume_exports_only_new_rounds() {
        let h = Harness::new("resume");
        let first = FakeLedger::new(vec![pay("T1", 10, "ALICE", ME, 1_000_000)], 20);
        h.run(&first, UnknownKindPolicy::Fail).await.unwrap();

        let second = FakeLedger::new(
            vec![
                pay("T1", 10, "ALICE", ME, 1_000_000),
                pay("T9", 25, "ALICE", ME, 3_000_000),
            ],
            30,
        );
        let summary = h.run(&second, UnknownKindPolicy::Fail).await.unwrap();
        assert_eq!(summary.records, 1);
        assert_eq!(summary.files, [h.dir.join("out/koinly-ME-21-30-1.csv")]);
        assert_eq!(h.last_round(), 30);
    }

    #[tokio::test]
    async fn test_unknown_kind_fails_without_advancing() {
        let h = Harness::new("unknown-fail");
        let mut odd = pay("ODD", 10, ME, "BOB", 1);
        odd.tx_type = "zzz".into();
        let ledger = FakeLedger::new(vec![odd], 20);

        let err = h.run(&ledger, UnknownKindPolicy::Fail).await.unwrap_err();
        assert!(format!("{err:#}").contains("unknown transaction type 'zzz'"));
        assert_eq!(h.last_round(), 0);
    }

    #[tokio::test]
    async fn test_unknown_kind_can_be_skipped() {
        let h = Harness::new("unknown-skip");
        let mut odd = pay("ODD", 10, ME, "BOB", 1);
        odd.tx_type = "zzz".into();
        let ledger = FakeLedger::new(vec![odd, pay("T2", 11, "ALICE", ME, 5)], 20);

        let summary = h.run(&ledger, UnknownKindPolicy::Skip).await.unwrap();
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.records, 1);
        assert_eq!(h.last_round(), 20);
    }

    #[tokio::test]
    async fn test_assets_are_looked_up_once() {
        let h = Harness::new("assets");
        let mut ledger = FakeLedger::new(
            vec![axfer("A1", 10, 31566704, 12345), axfer("A2", 11, 31566704, 100)],
            20,
        );
        ledger.assets.push(AssetInfo {
            id: 31566704,
            decimals: 2,
            unit_name: Some("USDC".into()),
            name: None,
        });

        let summary = h.run(&ledger, UnknownKindPolicy::Fail).await.unwrap();
        assert_eq!(summary.records, 2);
        assert_eq!(ledger.asset_lookups.get(), 1);

        let csv = fs::read_to_string(&summary.files[0]).unwrap();
        assert!(csv.contains(",123.45,USDC,"));
        assert!(csv.contains(",1,USDC,"));
    }

    #[tokio::test]
    async fn test_unresolvable_asset_is_fatal() {
        let h = Harness::new("asset-missing");
        let ledger = FakeLedger::new(vec![axfer("A1", 10, 777, 1)], 20);
        let err = h.run(&ledger, UnknownKindPolicy::Fail).await.unwrap_err();
        assert!(format!("{err:#}").contains("asset 777 not found"));
        assert_eq!(h.last_round(), 0);
    }

    #[tokio::test]
    async fn test_ledger_failure_mid_pagination_resumes_from_same_round() {
        let h = Harness::new("ledger-fail");
        let txns = vec![pay("T1", 10, "ALICE", ME, 1), pay("T2", 11, "ALICE", ME, 2)];
        let mut failing = FakeLedger::new(txns.clone(), 20);
        failing.page_size = 1;
        failing.fail_on_request = Some(1);

        assert!(h.run(&failing, UnknownKindPolicy::Fail).await.is_err());
        assert_eq!(h.last_round(), 0);
        assert_eq!(h.out_files(), ["koinly-ME-1-20-1.csv"]);

        let mut healthy = FakeLedger::new(txns, 20);
        healthy.page_size = 1;
        let summary = h.run(&healthy, UnknownKindPolicy::Fail).await.unwrap();

        assert_eq!(healthy.requests.borrow()[0], (1, None));
        assert_eq!(summary.records, 2);
        let second = fs::read_to_string(h.dir.join("out/koinly-ME-1-20-2.csv")).unwrap();
        assert!(second.lines().nth(1).unwrap().ends_with(",T2"));
        assert_eq!(h.last_round(), 20);
    }

    #[tokio::test]
    async fn test_inner_transactions_are_exported_under_parent_id() {
        let h = Harness::new("inner");
        let inner = RawTransaction {
            id: String::new(),
            confirmed_round: 10,
            ..pay("", 10, "APP", ME, 4_000_000)
        };
        let outer = RawTransaction {
            id: "OUTER".into(),
            sender: "ALICE".into(),
            confirmed_round: 10,
            round_time: 1_650_000_010,
            tx_type: "appl".into(),
            fee: 1000,
            inner_txns: vec![inner],
            ..Default::default()
        };
        let ledger = FakeLedger::new(vec![outer], 20);

        let summary = h.run(&ledger, UnknownKindPolicy::Fail).await.unwrap();
        assert_eq!(summary.records, 1);
        let csv = fs::read_to_string(&summary.files[0]).unwrap();
        assert!(csv.lines().nth(1).unwrap().ends_with(",4.000000,ALGO,,,,,,,OUTER"));
    }
}
