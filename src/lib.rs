pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

use crate::core::config::AppConfig;
use crate::core::converter::{Converter, ConverterState};
use crate::core::currency::Currency;
use anyhow::Result;
use tracing::{debug, info};

pub enum AppCommand {
    Rates,
    Convert {
        amount: String,
        from: Option<Currency>,
        to: Option<Currency>,
        save: bool,
    },
    History {
        limit: Option<usize>,
    },
    Interactive,
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Currency converter starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!(
        ai_provider = config.providers.ai.is_some(),
        history_limit = config.history_limit,
        "Loaded config"
    );

    let rate_provider = providers::rate_provider(&config);
    let recorder = store::open_recorder(&config);
    let state = ConverterState::new(config.default_from, config.default_to);

    match command {
        AppCommand::Rates => cli::rates::run(rate_provider.as_ref()).await,
        AppCommand::Convert {
            amount,
            from,
            to,
            save,
        } => {
            let mut converter = Converter::new(
                rate_provider.as_ref(),
                recorder.as_ref(),
                state,
                config.history_limit,
            );
            let args = cli::convert::ConvertArgs {
                amount,
                from: from.unwrap_or(config.default_from),
                to: to.unwrap_or(config.default_to),
                save,
            };
            cli::convert::run(&mut converter, args).await
        }
        AppCommand::History { limit } => {
            cli::history::run(recorder.as_ref(), limit.unwrap_or(config.history_limit)).await
        }
        AppCommand::Interactive => {
            let mut converter = Converter::new(
                rate_provider.as_ref(),
                recorder.as_ref(),
                state,
                config.history_limit,
            );
            cli::interactive::run(&mut converter).await
        }
    }
}
