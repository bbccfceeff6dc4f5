//! Asset decimal resolution and exact amount rendering.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::ScaleError;

pub const NATIVE_ASSET_ID: u64 = 0;
/// Microalgos per algo: 10^6.
pub const NATIVE_DECIMALS: u32 = 6;
pub const NATIVE_UNIT: &str = "ALGO";
/// Largest decimal count an asset may declare.
pub const MAX_DECIMALS: u32 = 19;

/// Metadata needed to render amounts of an asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetInfo {
    pub id: u64,
    pub decimals: u32,
    pub unit_name: Option<String>,
    pub name: Option<String>,
}

/// Render microalgos with exactly six decimal places.
pub fn format_native(micro: u64) -> String {
    Decimal::from_i128_with_scale(micro as i128, NATIVE_DECIMALS).to_string()
}

/// Per-run table of asset scales, filled on demand and never evicted.
#[derive(Debug, Default)]
pub struct AssetScales {
    assets: HashMap<u64, AssetInfo>,
}

impl AssetScales {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when `asset_id` still has to be fetched before it can be rendered.
    pub fn needs_lookup(&self, asset_id: u64) -> bool {
        asset_id != NATIVE_ASSET_ID && !self.assets.contains_key(&asset_id)
    }

    pub fn insert(&mut self, info: AssetInfo) -> Result<(), ScaleError> {
        if info.decimals > MAX_DECIMALS {
            return Err(ScaleError::DecimalsOutOfRange {
                asset_id: info.id,
                decimals: info.decimals,
            });
        }
        self.assets.insert(info.id, info);
        Ok(())
    }

    pub fn get(&self, asset_id: u64) -> Option<&AssetInfo> {
        self.assets.get(&asset_id)
    }

    pub fn decimals(&self, asset_id: u64) -> Result<u32, ScaleError> {
        if asset_id == NATIVE_ASSET_ID {
            return Ok(NATIVE_DECIMALS);
        }
        self.get(asset_id)
            .map(|a| a.decimals)
            .ok_or(ScaleError::UnknownAsset(asset_id))
    }

    /// Render `raw` minor units of `asset_id` as a decimal string.
    ///
    /// The native asset always shows six places. Other assets show their
    /// significant digits only; an asset with no decimals renders as an integer.
    pub fn scale_amount(&self, raw: u64, asset_id: u64) -> Result<String, ScaleError> {
        if asset_id == NATIVE_ASSET_ID {
            return Ok(format_native(raw));
        }
        let decimals = self.decimals(asset_id)?;
        if decimals == 0 {
            return Ok(raw.to_string());
        }
        Ok(Decimal::from_i128_with_scale(raw as i128, decimals)
            .normalize()
            .to_string())
    }

    /// Currency label: `ALGO`, the asset's unit name, or `ASA-<id>`.
    pub fn currency(&self, asset_id: u64) -> Result<String, ScaleError> {
        if asset_id == NATIVE_ASSET_ID {
            return Ok(NATIVE_UNIT.to_string());
        }
        let info = self.get(asset_id).ok_or(ScaleError::UnknownAsset(asset_id))?;
        Ok(info
            .unit_name
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("ASA-{asset_id}")))
    }

    /// Free-text description for comment columns.
    pub fn describe(&self, asset_id: u64) -> String {
        if asset_id == NATIVE_ASSET_ID {
            return "Algorand".to_string();
        }
        match self.get(asset_id).and_then(|a| a.name.as_deref()) {
            Some(name) if !name.trim().is_empty() => format!("ASA {asset_id} ({})", name.trim()),
            _ => format!("ASA {asset_id}"),
        }
    }
}
