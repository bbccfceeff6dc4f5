//! Indexer response shapes that do not map one-to-one onto core types.

use algexport_core::AssetInfo;
use serde::Deserialize;

/// `GET /v2/assets/{id}`
#[derive(Debug, Deserialize)]
pub struct AssetResponse {
    pub asset: Asset,
}

#[derive(Debug, Deserialize)]
pub struct Asset {
    pub index: u64,
    pub params: AssetParams,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct AssetParams {
    pub decimals: u32,
    pub unit_name: Option<String>,
    pub name: Option<String>,
}

impl From<AssetResponse> for AssetInfo {
    fn from(resp: AssetResponse) -> Self {
        AssetInfo {
            id: resp.asset.index,
            decimals: resp.asset.params.decimals,
            unit_name: resp.asset.params.unit_name,
            name: resp.asset.params.name,
        }
    }
}
