use crate::core::rates::{RateProvider, RateTable};
use anyhow::{Result, anyhow};
use async_trait::async_trait;

/// Used when no rate service is configured. Every fetch fails, so callers
/// always end up with the fallback table.
pub struct OfflineRateProvider;

#[async_trait]
impl RateProvider for OfflineRateProvider {
    async fn fetch_rates(&self) -> Result<RateTable> {
        Err(anyhow!("No exchange rate provider configured"))
    }
}
