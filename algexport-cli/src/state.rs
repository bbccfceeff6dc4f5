//! Checkpoint store: last exported round per (format, account).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub fn algexport_home() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".algexport"))
}

/// `~/.algexport/state.json`. The directory is created by the first save.
pub fn default_state_path() -> Result<PathBuf> {
    Ok(algexport_home()?.join("state.json"))
}

/// Resume point for one (format, account) pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountCursor {
    #[serde(rename = "LastRound")]
    pub last_round: u64,
}

impl AccountCursor {
    /// First round not yet exported.
    pub fn start_round(&self) -> u64 {
        self.last_round + 1
    }

    /// Move forward to `round`; never moves back.
    pub fn advance(&mut self, round: u64) {
        self.last_round = self.last_round.max(round);
    }
}

/// `{ format: { account: { "LastRound": n } } }`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExportState(BTreeMap<String, BTreeMap<String, AccountCursor>>);

impl ExportState {
    pub fn cursor(&self, format: &str, account: &str) -> AccountCursor {
        self.0
            .get(format)
            .and_then(|accounts| accounts.get(account))
            .copied()
            .unwrap_or_default()
    }

    /// Cursor for the pair, created at round 0 on first reference.
    pub fn cursor_mut(&mut self, format: &str, account: &str) -> &mut AccountCursor {
        self.0
            .entry(format.to_string())
            .or_default()
            .entry(account.to_string())
            .or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, AccountCursor)> {
        self.0.iter().flat_map(|(format, accounts)| {
            accounts
                .iter()
                .map(move |(account, cursor)| (format.as_str(), account.as_str(), *cursor))
        })
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(BTreeMap::is_empty)
    }
}

/// Whole-file JSON persistence for [`ExportState`].
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing file means nothing exported yet. A corrupt file is an error.
    pub fn load(&self) -> Result<ExportState> {
        if !self.path.exists() {
            return Ok(ExportState::default());
        }
        let s = fs::read_to_string(&self.path)
            .with_context(|| format!("read {}", self.path.display()))?;
        serde_json::from_str(&s).with_context(|| format!("parse {}", self.path.display()))
    }

    /// Write to a sibling temp file, then rename over the target.
    pub fn save(&self, state: &ExportState) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(state)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).with_context(|| format!("write {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("rename {} -> {}", tmp.display(), self.path.display()))?;
        tracing::debug!(path = %self.path.display(), "checkpoint saved");
        Ok(())
    }
}
