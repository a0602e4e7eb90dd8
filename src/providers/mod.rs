pub mod ai_rates;
pub mod offline;
pub mod util;

use crate::core::config::AppConfig;
use crate::core::rates::RateProvider;
use ai_rates::AiRateProvider;
use offline::OfflineRateProvider;

pub fn rate_provider(config: &AppConfig) -> Box<dyn RateProvider> {
    match &config.providers.ai {
        Some(ai) => Box::new(AiRateProvider::from_config(ai)),
        None => Box::new(OfflineRateProvider),
    }
}
