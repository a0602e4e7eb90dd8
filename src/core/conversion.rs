//! Rate resolution, conversion arithmetic and conversion records

use super::currency::{Currency, RatePair};
use super::rates::RateTable;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Multiplier that turns an amount in `from` into an amount in `to`.
pub fn resolve(from: Currency, to: Currency, table: &RateTable) -> f64 {
    use Currency::{Brl, Eur, Usd};

    match (from, to) {
        (Brl, Brl) | (Usd, Usd) | (Eur, Eur) => 1.0,
        (Usd, Brl) => table.rate(RatePair::UsdBrl),
        (Eur, Brl) => table.rate(RatePair::EurBrl),
        (Eur, Usd) => table.rate(RatePair::EurUsd),
        (Usd, Eur) => table.rate(RatePair::UsdEur),
        (Brl, Usd) => 1.0 / table.rate(RatePair::UsdBrl),
        (Brl, Eur) => 1.0 / table.rate(RatePair::EurBrl),
    }
}

/// Applies `rate` to `amount`, rounded half away from zero to cents.
pub fn convert(amount: f64, rate: f64) -> f64 {
    (amount * rate * 100.0).round() / 100.0
}

pub fn format_amount(amount: f64) -> String {
    format!("{amount:.2}")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewConversion {
    pub from_currency: Currency,
    pub to_currency: Currency,
    pub from_amount: f64,
    pub to_amount: f64,
    pub exchange_rate: f64,
    pub conversion_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionRecord {
    pub id: u64,
    pub from_currency: Currency,
    pub to_currency: Currency,
    pub from_amount: f64,
    pub to_amount: f64,
    pub exchange_rate: f64,
    pub conversion_date: DateTime<Utc>,
}

impl ConversionRecord {
    pub fn from_new(id: u64, conversion: NewConversion) -> Self {
        Self {
            id,
            from_currency: conversion.from_currency,
            to_currency: conversion.to_currency,
            from_amount: conversion.from_amount,
            to_amount: conversion.to_amount,
            exchange_rate: conversion.exchange_rate,
            conversion_date: conversion.conversion_date,
        }
    }
}

/// Newest conversion first; ties go to the most recently assigned id.
pub fn sort_newest_first(records: &mut [ConversionRecord]) {
    records.sort_by(|a, b| {
        b.conversion_date
            .cmp(&a.conversion_date)
            .then(b.id.cmp(&a.id))
    });
}

#[async_trait]
pub trait ConversionRecorder: Send + Sync {
    async fn record(&self, conversion: NewConversion) -> Result<ConversionRecord>;
    async fn list_recent(&self, limit: usize) -> Result<Vec<ConversionRecord>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    const PAIRS: [(Currency, Currency); 6] = [
        (Currency::Brl, Currency::Usd),
        (Currency::Brl, Currency::Eur),
        (Currency::Usd, Currency::Brl),
        (Currency::Eur, Currency::Brl),
        (Currency::Eur, Currency::Usd),
        (Currency::Usd, Currency::Eur),
    ];

    #[test]
    fn test_identity_rate_is_one() {
        let tables = [
            RateTable::new(),
            RateTable::fallback(),
            RateTable::new().with(RatePair::UsdBrl, 7.0),
        ];
        for table in &tables {
            for currency in Currency::ALL {
                assert_eq!(resolve(currency, currency, table), 1.0);
            }
        }
    }

    #[test]
    fn test_direct_and_inverse_lookup() {
        let table = RateTable::new()
            .with(RatePair::UsdBrl, 5.40)
            .with(RatePair::EurBrl, 5.90)
            .with(RatePair::EurUsd, 1.10)
            .with(RatePair::UsdEur, 0.91);

        assert_eq!(resolve(Currency::Usd, Currency::Brl, &table), 5.40);
        assert_eq!(resolve(Currency::Eur, Currency::Brl, &table), 5.90);
        assert_eq!(resolve(Currency::Eur, Currency::Usd, &table), 1.10);
        assert_eq!(resolve(Currency::Usd, Currency::Eur, &table), 0.91);
        assert_eq!(resolve(Currency::Brl, Currency::Usd, &table), 1.0 / 5.40);
        assert_eq!(resolve(Currency::Brl, Currency::Eur, &table), 1.0 / 5.90);
    }

    #[test]
    fn test_missing_entries_use_fallback_constants() {
        let empty = RateTable::new();
        assert_eq!(resolve(Currency::Usd, Currency::Brl, &empty), 5.10);
        assert_eq!(resolve(Currency::Eur, Currency::Brl, &empty), 5.55);
        assert_eq!(resolve(Currency::Eur, Currency::Usd, &empty), 1.09);
        assert_eq!(resolve(Currency::Usd, Currency::Eur, &empty), 0.92);
        assert_eq!(resolve(Currency::Brl, Currency::Usd, &empty), 1.0 / 5.10);
    }

    #[test]
    fn test_inverse_consistency() {
        let eur_usd = 1.0842;
        let table = RateTable::new()
            .with(RatePair::UsdBrl, 5.3312)
            .with(RatePair::EurBrl, 5.7801)
            .with(RatePair::EurUsd, eur_usd)
            .with(RatePair::UsdEur, 1.0 / eur_usd);

        for (from, to) in PAIRS {
            let forward = resolve(from, to, &table);
            let backward = resolve(to, from, &table);
            assert!(
                (forward - 1.0 / backward).abs() < 1e-9,
                "{from}->{to}: {forward} vs 1/{backward}"
            );
        }
    }

    #[test]
    fn test_convert_rounds_to_cents() {
        assert_eq!(convert(100.0, 5.10), 510.0);
        assert_eq!(convert(50.0, 1.0 / 5.10), 9.80);
        assert_eq!(convert(10.0, 0.12345), 1.23);
        assert_eq!(convert(10.0, 0.12355), 1.24);

        for (amount, rate) in [(1.0, 0.333333), (123.456, 1.09), (0.01, 5.55)] {
            let result = convert(amount, rate);
            assert!(((result * 100.0).round() - result * 100.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(510.0), "510.00");
        assert_eq!(format_amount(9.8), "9.80");
    }

    #[test]
    fn test_sort_newest_first() {
        let now = Utc::now();
        let record = |id, offset: i64| ConversionRecord {
            id,
            from_currency: Currency::Usd,
            to_currency: Currency::Brl,
            from_amount: 1.0,
            to_amount: 5.1,
            exchange_rate: 5.1,
            conversion_date: now + Duration::seconds(offset),
        };
        let mut records = vec![record(1, 0), record(2, 10), record(3, 0), record(4, -5)];
        sort_newest_first(&mut records);
        let ids: Vec<u64> = records.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![2, 3, 1, 4]);
    }
}
