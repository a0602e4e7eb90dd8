//! Converter state and the session that drives it against rate and history collaborators

use super::conversion::{
    ConversionRecord, ConversionRecorder, NewConversion, convert, format_amount, resolve,
};
use super::currency::Currency;
use super::error::{ConvertError, ValidationError};
use super::rates::{RateProvider, RateSnapshot, RateTable, refresh_rates};
use anyhow::Result;
use chrono::Utc;
use futures::future::{FutureExt, LocalBoxFuture};
use tracing::{debug, info, warn};

/// Selections and amounts as shown to the user.
///
/// Every setter recomputes the derived target amount, so `to_amount` always
/// reflects the current amount, currencies and rate table.
#[derive(Debug, Clone, PartialEq)]
pub struct ConverterState {
    from_currency: Currency,
    to_currency: Currency,
    from_amount: String,
    to_amount: String,
    rates: RateTable,
}

impl ConverterState {
    pub fn new(from_currency: Currency, to_currency: Currency) -> Self {
        Self {
            from_currency,
            to_currency,
            from_amount: String::new(),
            to_amount: String::new(),
            rates: RateTable::new(),
        }
    }

    pub fn from_currency(&self) -> Currency {
        self.from_currency
    }

    pub fn to_currency(&self) -> Currency {
        self.to_currency
    }

    pub fn from_amount(&self) -> &str {
        &self.from_amount
    }

    pub fn to_amount(&self) -> &str {
        &self.to_amount
    }

    pub fn rates(&self) -> &RateTable {
        &self.rates
    }

    pub fn set_from_currency(&mut self, currency: Currency) {
        self.from_currency = currency;
        self.recompute();
    }

    pub fn set_to_currency(&mut self, currency: Currency) {
        self.to_currency = currency;
        self.recompute();
    }

    pub fn set_amount(&mut self, amount: &str) {
        self.from_amount = amount.trim().to_string();
        self.recompute();
    }

    pub fn set_rates(&mut self, rates: RateTable) {
        self.rates = rates;
        self.recompute();
    }

    /// Exchanges both currencies and both displayed amounts in one step, then
    /// recomputes the target side from the new source amount.
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.from_currency, &mut self.to_currency);
        std::mem::swap(&mut self.from_amount, &mut self.to_amount);
        self.recompute();
    }

    pub fn rate(&self) -> f64 {
        resolve(self.from_currency, self.to_currency, &self.rates)
    }

    /// The entered amount when it is a positive, finite number.
    pub fn amount(&self) -> Option<f64> {
        self.from_amount
            .parse::<f64>()
            .ok()
            .filter(|amount| amount.is_finite() && *amount > 0.0)
    }

    pub fn validate(&self) -> Result<f64, ValidationError> {
        let amount = self.amount().ok_or(ValidationError::InvalidAmount)?;
        if self.from_currency == self.to_currency {
            return Err(ValidationError::SameCurrency);
        }
        Ok(amount)
    }

    fn recompute(&mut self) {
        self.to_amount = match self.amount() {
            Some(amount) => format_amount(convert(amount, self.rate())),
            None => String::new(),
        };
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Activity {
    Rates,
    History,
    Conversion,
}

/// Receives loading notifications so each activity can be indicated separately.
pub trait LoadObserver: Sync {
    fn started(&self, activity: Activity);
    fn finished(&self, activity: Activity);
}

impl LoadObserver for () {
    fn started(&self, _activity: Activity) {}
    fn finished(&self, _activity: Activity) {}
}

#[derive(Debug, Default)]
pub struct RefreshOutcome {
    pub history_error: Option<anyhow::Error>,
}

/// Drives a [`ConverterState`] against the rate provider and history store.
///
/// Loads are exposed as futures that hold only the collaborators, never the
/// session, so a caller can keep editing the state while they run and apply
/// each result when it arrives. The last applied result wins.
pub struct Converter<'a> {
    rate_provider: &'a dyn RateProvider,
    recorder: &'a dyn ConversionRecorder,
    history_limit: usize,
    state: ConverterState,
    snapshot: Option<RateSnapshot>,
    history: Vec<ConversionRecord>,
}

impl<'a> Converter<'a> {
    pub fn new(
        rate_provider: &'a dyn RateProvider,
        recorder: &'a dyn ConversionRecorder,
        state: ConverterState,
        history_limit: usize,
    ) -> Self {
        Self {
            rate_provider,
            recorder,
            history_limit,
            state,
            snapshot: None,
            history: Vec::new(),
        }
    }

    pub fn state(&self) -> &ConverterState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut ConverterState {
        &mut self.state
    }

    pub fn snapshot(&self) -> Option<&RateSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn history(&self) -> &[ConversionRecord] {
        &self.history
    }

    pub fn load_rates<'o>(
        &self,
        observer: &'o dyn LoadObserver,
    ) -> LocalBoxFuture<'o, RateSnapshot>
    where
        'a: 'o,
    {
        let rate_provider = self.rate_provider;
        async move {
            observer.started(Activity::Rates);
            let snapshot = refresh_rates(rate_provider).await;
            observer.finished(Activity::Rates);
            snapshot
        }
        .boxed_local()
    }

    pub fn load_history<'o>(
        &self,
        observer: &'o dyn LoadObserver,
    ) -> LocalBoxFuture<'o, Result<Vec<ConversionRecord>>>
    where
        'a: 'o,
    {
        let recorder = self.recorder;
        let limit = self.history_limit;
        async move {
            observer.started(Activity::History);
            let history = recorder.list_recent(limit).await;
            observer.finished(Activity::History);
            history
        }
        .boxed_local()
    }

    /// Validates the current input and returns the pending write for it.
    ///
    /// The conversion is captured now, so later edits do not change what is
    /// recorded.
    pub fn submit<'o>(
        &self,
        observer: &'o dyn LoadObserver,
    ) -> Result<LocalBoxFuture<'o, Result<ConversionRecord, ConvertError>>, ValidationError>
    where
        'a: 'o,
    {
        let amount = self.state.validate()?;
        let rate = self.state.rate();
        let conversion = NewConversion {
            from_currency: self.state.from_currency(),
            to_currency: self.state.to_currency(),
            from_amount: amount,
            to_amount: amount * rate,
            exchange_rate: rate,
            conversion_date: Utc::now(),
        };

        let recorder = self.recorder;
        Ok(async move {
            observer.started(Activity::Conversion);
            let record = recorder
                .record(conversion)
                .await
                .map_err(ConvertError::Persistence);
            observer.finished(Activity::Conversion);

            if let Ok(record) = &record {
                info!(
                    id = record.id,
                    from = %record.from_currency,
                    to = %record.to_currency,
                    "Recorded conversion"
                );
            }
            record
        }
        .boxed_local())
    }

    pub fn apply_snapshot(&mut self, snapshot: RateSnapshot) {
        self.state.set_rates(snapshot.table.clone());
        self.snapshot = Some(snapshot);
    }

    /// Replaces the history list. A failed load keeps the previous list.
    pub fn apply_history(&mut self, history: Result<Vec<ConversionRecord>>) -> Result<()> {
        match history {
            Ok(records) => {
                debug!(count = records.len(), "Loaded conversion history");
                self.history = records;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Failed to load conversion history");
                Err(e)
            }
        }
    }

    /// Refreshes rates and history concurrently.
    ///
    /// Rates always resolve to a snapshot. A failed history load keeps the
    /// previous list and is reported in the outcome.
    pub async fn refresh(&mut self, observer: &dyn LoadObserver) -> RefreshOutcome {
        let (snapshot, history) =
            futures::join!(self.load_rates(observer), self.load_history(observer));

        self.apply_snapshot(snapshot);
        RefreshOutcome {
            history_error: self.apply_history(history).err(),
        }
    }

    pub async fn reload_history(&mut self, observer: &dyn LoadObserver) -> Result<()> {
        let history = self.load_history(observer).await;
        self.apply_history(history)
    }

    /// Validates and records the current conversion, then reloads history.
    ///
    /// On a persistence failure the derived amount stays on display but nothing
    /// is considered saved.
    pub async fn confirm(
        &mut self,
        observer: &dyn LoadObserver,
    ) -> Result<ConversionRecord, ConvertError> {
        let record = self.submit(observer)?.await?;
        // A failed reload is logged by apply_history and leaves the old list.
        let _ = self.reload_history(observer).await;
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::currency::RatePair;
    use crate::store::memory::MemoryRecorder;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct StaticProvider(RateTable);

    #[async_trait]
    impl RateProvider for StaticProvider {
        async fn fetch_rates(&self) -> Result<RateTable> {
            Ok(self.0.clone())
        }
    }

    struct FailingProvider;

    #[async_trait]
    impl RateProvider for FailingProvider {
        async fn fetch_rates(&self) -> Result<RateTable> {
            Err(anyhow!("timeout"))
        }
    }

    struct BrokenRecorder;

    #[async_trait]
    impl ConversionRecorder for BrokenRecorder {
        async fn record(&self, _conversion: NewConversion) -> Result<ConversionRecord> {
            Err(anyhow!("disk full"))
        }

        async fn list_recent(&self, _limit: usize) -> Result<Vec<ConversionRecord>> {
            Err(anyhow!("disk unreadable"))
        }
    }

    #[derive(Default)]
    struct RecordingObserver {
        events: Mutex<Vec<(Activity, bool)>>,
    }

    impl LoadObserver for RecordingObserver {
        fn started(&self, activity: Activity) {
            self.events.lock().unwrap().push((activity, true));
        }

        fn finished(&self, activity: Activity) {
            self.events.lock().unwrap().push((activity, false));
        }
    }

    fn usd_brl_table() -> RateTable {
        RateTable::new().with(RatePair::UsdBrl, 5.10)
    }

    #[test]
    fn test_usd_to_brl() {
        let mut state = ConverterState::new(Currency::Usd, Currency::Brl);
        state.set_rates(usd_brl_table());
        state.set_amount("100");
        assert_eq!(state.to_amount(), "510.00");
    }

    #[test]
    fn test_brl_to_usd_uses_inverse_rate() {
        let mut state = ConverterState::new(Currency::Brl, Currency::Usd);
        state.set_rates(usd_brl_table());
        state.set_amount("50");
        assert_eq!(state.to_amount(), "9.80");
    }

    #[test]
    fn test_same_currency_shows_amount_but_fails_validation() {
        let mut state = ConverterState::new(Currency::Eur, Currency::Eur);
        state.set_amount("42.5");
        assert_eq!(state.to_amount(), "42.50");
        assert_eq!(state.validate(), Err(ValidationError::SameCurrency));
    }

    #[test]
    fn test_clearing_amount_clears_result() {
        let mut state = ConverterState::new(Currency::Usd, Currency::Brl);
        state.set_amount("100");
        assert_eq!(state.to_amount(), "510.00");

        state.set_amount("");
        assert_eq!(state.to_amount(), "");

        state.set_amount("-3");
        assert_eq!(state.to_amount(), "");
        state.set_amount("abc");
        assert_eq!(state.to_amount(), "");
        assert_eq!(state.validate(), Err(ValidationError::InvalidAmount));
    }

    #[test]
    fn test_changes_trigger_recompute() {
        let mut state = ConverterState::new(Currency::Usd, Currency::Brl);
        state.set_amount("10");
        assert_eq!(state.to_amount(), "51.00");

        state.set_to_currency(Currency::Eur);
        assert_eq!(state.to_amount(), "9.20");

        state.set_from_currency(Currency::Eur);
        assert_eq!(state.to_amount(), "10.00");

        state.set_to_currency(Currency::Brl);
        state.set_rates(RateTable::new().with(RatePair::EurBrl, 6.0));
        assert_eq!(state.to_amount(), "60.00");
    }

    #[test]
    fn test_swap_is_self_inverse() {
        let mut state = ConverterState::new(Currency::Usd, Currency::Brl);
        state.set_rates(usd_brl_table());
        state.set_amount("12.34");
        assert_eq!(state.to_amount(), "62.93");
        let original = state.clone();

        state.swap();
        assert_eq!(state.from_currency(), Currency::Brl);
        assert_eq!(state.to_currency(), Currency::Usd);
        assert_eq!(state.from_amount(), "62.93");
        assert_eq!(state.to_amount(), "12.34");

        state.swap();
        assert_eq!(state, original);
    }

    #[test]
    fn test_swap_recomputes_with_target_rate() {
        let mut state = ConverterState::new(Currency::Usd, Currency::Eur);
        state.set_rates(RateTable::fallback());
        state.set_amount("100");
        assert_eq!(state.to_amount(), "92.00");

        state.swap();
        assert_eq!(state.from_currency(), Currency::Eur);
        assert_eq!(state.to_currency(), Currency::Usd);
        assert_eq!(state.from_amount(), "92.00");
        assert_eq!(state.to_amount(), format_amount(convert(92.0, 1.09)));
        assert_eq!(state.to_amount(), "100.28");
    }

    #[test]
    fn test_swap_with_empty_amount_keeps_fields_empty() {
        let mut state = ConverterState::new(Currency::Brl, Currency::Eur);
        state.swap();
        assert_eq!(state.from_currency(), Currency::Eur);
        assert_eq!(state.from_amount(), "");
        assert_eq!(state.to_amount(), "");
    }

    #[tokio::test]
    async fn test_refresh_falls_back_and_loads_history() {
        let recorder = MemoryRecorder::new();
        let observer = RecordingObserver::default();
        let mut converter = Converter::new(
            &FailingProvider,
            &recorder,
            ConverterState::new(Currency::Brl, Currency::Usd),
            10,
        );

        let outcome = converter.refresh(&observer).await;
        assert!(outcome.history_error.is_none());

        let snapshot = converter.snapshot().unwrap();
        assert!(snapshot.is_fallback());
        assert_eq!(snapshot.table, RateTable::fallback());
        assert_eq!(converter.state().rates(), &RateTable::fallback());

        let events = observer.events.lock().unwrap();
        assert_eq!(events.len(), 4);
        assert!(events.contains(&(Activity::Rates, true)));
        assert!(events.contains(&(Activity::Rates, false)));
        assert!(events.contains(&(Activity::History, true)));
        assert!(events.contains(&(Activity::History, false)));
    }

    #[tokio::test]
    async fn test_confirm_records_and_reloads_history() {
        let provider = StaticProvider(usd_brl_table());
        let recorder = MemoryRecorder::new();
        let mut converter = Converter::new(
            &provider,
            &recorder,
            ConverterState::new(Currency::Usd, Currency::Brl),
            10,
        );
        converter.refresh(&()).await;
        converter.state_mut().set_amount("100");

        let record = converter.confirm(&()).await.unwrap();
        assert_eq!(record.from_currency, Currency::Usd);
        assert_eq!(record.to_currency, Currency::Brl);
        assert_eq!(record.from_amount, 100.0);
        assert!((record.to_amount - 510.0).abs() < 1e-9);
        assert_eq!(record.exchange_rate, 5.10);

        assert_eq!(converter.history().len(), 1);
        assert_eq!(converter.history()[0], record);
    }

    #[tokio::test]
    async fn test_confirm_rejects_invalid_input_without_recording() {
        let recorder = MemoryRecorder::new();
        let mut converter = Converter::new(
            &FailingProvider,
            &recorder,
            ConverterState::new(Currency::Eur, Currency::Eur),
            10,
        );

        let err = converter.confirm(&()).await.unwrap_err();
        assert!(matches!(
            err,
            ConvertError::Validation(ValidationError::InvalidAmount)
        ));

        converter.state_mut().set_amount("10");
        let err = converter.confirm(&()).await.unwrap_err();
        assert!(matches!(
            err,
            ConvertError::Validation(ValidationError::SameCurrency)
        ));
        assert!(recorder.list_recent(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_confirm_reports_conversion_then_history_loading() {
        let recorder = MemoryRecorder::new();
        let observer = RecordingObserver::default();
        let mut converter = Converter::new(
            &FailingProvider,
            &recorder,
            ConverterState::new(Currency::Usd, Currency::Brl),
            10,
        );
        converter.state_mut().set_amount("100");

        converter.confirm(&observer).await.unwrap();

        let events = observer.events.lock().unwrap();
        assert_eq!(
            *events,
            vec![
                (Activity::Conversion, true),
                (Activity::Conversion, false),
                (Activity::History, true),
                (Activity::History, false),
            ]
        );
    }

    #[tokio::test]
    async fn test_submit_captures_input_at_submit_time() {
        let recorder = MemoryRecorder::new();
        let mut converter = Converter::new(
            &FailingProvider,
            &recorder,
            ConverterState::new(Currency::Usd, Currency::Brl),
            10,
        );
        converter.state_mut().set_amount("10");

        let pending = converter.submit(&()).unwrap();
        converter.state_mut().set_amount("99");
        converter.state_mut().set_to_currency(Currency::Eur);
        let record = pending.await.unwrap();

        assert_eq!(record.from_amount, 10.0);
        assert_eq!(record.to_currency, Currency::Brl);
        assert_eq!(converter.state().from_amount(), "99");
        assert!(converter.history().is_empty());
    }

    #[tokio::test]
    async fn test_persistence_failures_are_not_fatal() {
        let provider = StaticProvider(usd_brl_table());
        let mut converter = Converter::new(
            &provider,
            &BrokenRecorder,
            ConverterState::new(Currency::Usd, Currency::Brl),
            10,
        );

        let outcome = converter.refresh(&()).await;
        assert!(outcome.history_error.is_some());
        assert!(converter.history().is_empty());
        assert!(!converter.snapshot().unwrap().is_fallback());

        converter.state_mut().set_amount("100");
        let err = converter.confirm(&()).await.unwrap_err();
        assert!(matches!(err, ConvertError::Persistence(_)));
        assert_eq!(
            err.to_string(),
            "Failed to record conversion: disk full"
        );
        assert_eq!(converter.state().to_amount(), "510.00");
    }
}
