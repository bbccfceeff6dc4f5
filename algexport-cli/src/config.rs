use algexport_indexer::IndexerConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::state::algexport_home;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub indexer: IndexerConfig,
    pub export: ExportSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSection {
    /// Format used when `--format` is not given.
    pub format: String,
    pub out_dir: PathBuf,
    /// Minimum spacing between indexer requests.
    pub request_delay_ms: u64,
    pub on_unknown_kind: UnknownKindPolicy,
    /// Checkpoint file; defaults to ~/.algexport/state.json
    pub state_file: Option<PathBuf>,
}

/// What to do with a transaction type the engine does not recognize.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownKindPolicy {
    /// Abort the run.
    #[default]
    Fail,
    /// Log a warning and emit nothing for that transaction.
    Skip,
}

impl Default for ExportSection {
    fn default() -> Self {
        Self {
            format: algexport_formats::koinly::NAME.to_string(),
            out_dir: PathBuf::from("."),
            request_delay_ms: 2000,
            on_unknown_kind: UnknownKindPolicy::Fail,
            state_file: None,
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(algexport_home()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    load_config_from(&config_path()?)
}

/// A missing file means every default applies. Reading never creates anything.
pub fn load_config_from(path: &Path) -> Result<Config> {
    match fs::read_to_string(path) {
        Ok(s) => parse_config(&s).with_context(|| format!("parse {}", path.display())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Config::default()),
        Err(e) => Err(e).with_context(|| format!("read {}", path.display())),
    }
}

pub fn parse_config(s: &str) -> Result<Config> {
    Ok(toml::from_str(s)?)
}

/// Write the defaults to `path` unless a file is already there.
/// Returns whether anything was written.
pub fn write_default_config(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    }
    let body = toml::to_string_pretty(&Config::default()).context("serialize config")?;
    fs::write(path, body).with_context(|| format!("write {}", path.display()))?;
    Ok(true)
}
