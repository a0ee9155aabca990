//! One-shot feeds for the landing view: supply history, top assets and the
//! sanctions headline figures. Opaque presentation data; the explorer core
//! never depends on any of this.

use chrono::NaiveDateTime;
use serde::Deserialize;

use crate::fetch::{ApiClient, FetchError};

/// A day of aggregated stablecoin supply.
#[derive(Debug, Clone, Deserialize)]
pub struct GlobalSupplyPoint {
    pub timestamp: NaiveDateTime,
    pub total_supply: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssetSupply {
    pub symbol: String,
    pub name: String,
    pub supply: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RiskStats {
    pub total_entities: u64,
    pub total_addresses: u64,
}

/// Sanctioned address count for one chain.
#[derive(Debug, Clone, Deserialize)]
pub struct ChainSummary {
    pub chain: String,
    pub count: u64,
}

/// Total supply over the last `days` days, newest first.
pub async fn global_supply(
    api: &ApiClient,
    days: u32,
) -> Result<Vec<GlobalSupplyPoint>, FetchError> {
    api.get_json("/supply/global", &[("days", days.to_string())])
        .await
}

/// The `limit` largest assets by circulating supply.
pub async fn top_assets(api: &ApiClient, limit: usize) -> Result<Vec<AssetSupply>, FetchError> {
    api.get_json("/supply/assets", &[("limit", limit.to_string())])
        .await
}

pub async fn risk_stats(api: &ApiClient) -> Result<RiskStats, FetchError> {
    api.get_json("/risk/stats", &[]).await
}

/// Per-chain sanctioned address counts, largest first.
pub async fn sanctions_summary(api: &ApiClient) -> Result<Vec<ChainSummary>, FetchError> {
    api.get_json("/risk/sanctions/summary", &[]).await
}
