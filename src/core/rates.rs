//! Exchange rate tables and the providers that populate them

use super::currency::RatePair;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Quoted rates keyed by pair. Only positive, finite rates are stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RateTable {
    rates: BTreeMap<RatePair, f64>,
}

impl RateTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The table used whenever live rates cannot be fetched.
    pub fn fallback() -> Self {
        RatePair::ALL
            .into_iter()
            .fold(Self::new(), |table, pair| table.with(pair, pair.fallback_rate()))
    }

    pub fn with(mut self, pair: RatePair, rate: f64) -> Self {
        self.insert(pair, rate);
        self
    }

    pub fn insert(&mut self, pair: RatePair, rate: f64) {
        if rate.is_finite() && rate > 0.0 {
            self.rates.insert(pair, rate);
        } else {
            debug!(%pair, rate, "Ignoring unusable rate");
        }
    }

    /// The quoted rate for `pair`, if one is present.
    pub fn get(&self, pair: RatePair) -> Option<f64> {
        self.rates.get(&pair).copied()
    }

    /// The quoted rate for `pair`, or its fallback constant when absent.
    pub fn rate(&self, pair: RatePair) -> f64 {
        self.get(pair).unwrap_or_else(|| pair.fallback_rate())
    }

    pub fn is_complete(&self) -> bool {
        RatePair::ALL.iter().all(|pair| self.rates.contains_key(pair))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RateOrigin {
    Live,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateSnapshot {
    pub table: RateTable,
    pub origin: RateOrigin,
    pub updated_at: DateTime<Utc>,
}

impl RateSnapshot {
    pub fn live(table: RateTable) -> Self {
        Self {
            table,
            origin: RateOrigin::Live,
            updated_at: Utc::now(),
        }
    }

    pub fn fallback() -> Self {
        Self {
            table: RateTable::fallback(),
            origin: RateOrigin::Fallback,
            updated_at: Utc::now(),
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.origin == RateOrigin::Fallback
    }
}

#[async_trait]
pub trait RateProvider: Send + Sync {
    async fn fetch_rates(&self) -> Result<RateTable>;
}

/// Fetches a fresh table, substituting the fallback table when the provider fails.
pub async fn refresh_rates(provider: &dyn RateProvider) -> RateSnapshot {
    match provider.fetch_rates().await {
        Ok(table) => {
            if !table.is_complete() {
                warn!(?table, "Provider returned a partial rate table");
            }
            debug!(?table, "Fetched live rates");
            RateSnapshot::live(table)
        }
        Err(e) => {
            warn!(error = %e, "Failed to fetch exchange rates, using fallback rates");
            RateSnapshot::fallback()
        }
    }
}
