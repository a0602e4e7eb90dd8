//! Line-driven converter session.
//!
//! Each input line is one user action. Currency selections are independent,
//! so picking the same currency on both sides is only rejected on `convert`.
//! Rate, history and save loads run in the background while input keeps being
//! read; each result is applied when it arrives.

use super::{convert, history, rates, ui};
use crate::core::conversion::ConversionRecord;
use crate::core::converter::{Converter, LoadObserver};
use crate::core::currency::Currency;
use crate::core::error::ConvertError;
use crate::core::rates::RateSnapshot;
use anyhow::{Result, anyhow, bail};
use futures::future::{FutureExt, LocalBoxFuture};
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::io::{AsyncBufReadExt, BufReader};

const HELP: &str = "\
Commands:
  from <BRL|USD|EUR>   select the source currency
  to <BRL|USD|EUR>     select the target currency
  amount [value]       set the amount (a bare number works too, no value clears it)
  swap                 exchange currencies and amounts
  convert              save the current conversion
  refresh              reload rates and history
  rates                show the current rates
  history              show recent conversions
  help                 show this message
  quit                 leave the session";

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    From(Currency),
    To(Currency),
    Amount(String),
    Swap,
    Convert,
    Refresh,
    Rates,
    History,
    Help,
    Quit,
}

pub fn parse_action(line: &str) -> Result<Action> {
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        bail!("Empty command, type 'help' for a list of commands");
    };
    let argument = words.next();

    let action = match command.to_lowercase().as_str() {
        "from" => Action::From(currency_argument(argument)?),
        "to" => Action::To(currency_argument(argument)?),
        "amount" => Action::Amount(argument.unwrap_or_default().to_string()),
        "swap" => Action::Swap,
        "convert" | "save" => Action::Convert,
        "refresh" => Action::Refresh,
        "rates" => Action::Rates,
        "history" => Action::History,
        "help" | "?" => Action::Help,
        "quit" | "exit" | "q" => Action::Quit,
        other if other.parse::<f64>().is_ok() => Action::Amount(other.to_string()),
        other => bail!("Unknown command '{}', type 'help' for a list of commands", other),
    };
    Ok(action)
}

fn currency_argument(argument: Option<&str>) -> Result<Currency> {
    argument
        .ok_or_else(|| anyhow!("Missing currency, expected one of BRL, USD, EUR"))?
        .parse()
}

pub struct Step {
    pub output: String,
    pub quit: bool,
}

impl Step {
    fn show(output: String) -> Self {
        Self {
            output,
            quit: false,
        }
    }
}

/// A finished background load, waiting to be applied to the session.
pub enum Completion {
    Rates(RateSnapshot),
    History(Result<Vec<ConversionRecord>>),
    Recorded(Result<ConversionRecord, ConvertError>),
}

pub type Pending<'o> = FuturesUnordered<LocalBoxFuture<'o, Completion>>;

fn error_notice(message: &str) -> String {
    ui::style_text(message, ui::StyleType::Error)
}

fn start_refresh<'a: 'o, 'o>(
    converter: &Converter<'a>,
    observer: &'o dyn LoadObserver,
    pending: &mut Pending<'o>,
) {
    pending.push(converter.load_rates(observer).map(Completion::Rates).boxed_local());
    start_history(converter, observer, pending);
}

fn start_history<'a: 'o, 'o>(
    converter: &Converter<'a>,
    observer: &'o dyn LoadObserver,
    pending: &mut Pending<'o>,
) {
    pending.push(
        converter
            .load_history(observer)
            .map(Completion::History)
            .boxed_local(),
    );
}

/// Applies one user action. Loads are queued on `pending` and never awaited here.
pub fn handle<'a: 'o, 'o>(
    converter: &mut Converter<'a>,
    action: Action,
    observer: &'o dyn LoadObserver,
    pending: &mut Pending<'o>,
) -> Step {
    match action {
        Action::From(currency) => {
            converter.state_mut().set_from_currency(currency);
            Step::show(convert::render_conversion(converter))
        }
        Action::To(currency) => {
            converter.state_mut().set_to_currency(currency);
            Step::show(convert::render_conversion(converter))
        }
        Action::Amount(amount) => {
            converter.state_mut().set_amount(&amount);
            Step::show(convert::render_conversion(converter))
        }
        Action::Swap => {
            converter.state_mut().swap();
            Step::show(convert::render_conversion(converter))
        }
        Action::Convert => match converter.submit(observer) {
            Ok(write) => {
                pending.push(write.map(Completion::Recorded).boxed_local());
                Step::show(ui::style_text("Converting...", ui::StyleType::Subtle))
            }
            Err(e) => Step::show(error_notice(&e.to_string())),
        },
        Action::Refresh => {
            start_refresh(converter, observer, pending);
            Step::show(ui::style_text(
                "Refreshing rates and history...",
                ui::StyleType::Subtle,
            ))
        }
        Action::Rates => Step::show(match converter.snapshot() {
            Some(snapshot) => rates::render_rates(snapshot),
            None => error_notice("Rates not loaded yet, type 'refresh'"),
        }),
        Action::History => Step::show(history::render_history(converter.history())),
        Action::Help => Step::show(HELP.to_string()),
        Action::Quit => Step {
            output: String::new(),
            quit: true,
        },
    }
}

/// Applies a finished load and renders what changed.
pub fn complete<'a: 'o, 'o>(
    converter: &mut Converter<'a>,
    completion: Completion,
    observer: &'o dyn LoadObserver,
    pending: &mut Pending<'o>,
) -> String {
    match completion {
        Completion::Rates(snapshot) => {
            converter.apply_snapshot(snapshot);
            convert::render_conversion(converter)
        }
        Completion::History(records) => match converter.apply_history(records) {
            Ok(()) => history::render_history(converter.history()),
            Err(e) => error_notice(&format!("Could not load conversion history: {e}")),
        },
        Completion::Recorded(Ok(_)) => {
            start_history(converter, observer, pending);
            ui::style_text("Conversion saved", ui::StyleType::Success)
        }
        Completion::Recorded(Err(e)) => format!(
            "{}\n{}",
            error_notice(&e.to_string()),
            convert::render_conversion(converter)
        ),
    }
}

/// Waits for every queued load, including the ones queued while draining.
pub async fn drain<'a: 'o, 'o>(
    converter: &mut Converter<'a>,
    observer: &'o dyn LoadObserver,
    pending: &mut Pending<'o>,
) -> Vec<String> {
    let mut outputs = Vec::new();
    while let Some(completion) = pending.next().await {
        outputs.push(complete(converter, completion, observer, pending));
    }
    outputs
}

pub async fn run(converter: &mut Converter<'_>) -> Result<()> {
    let observer = ui::SpinnerObserver::new();
    let mut pending = Pending::new();
    start_refresh(converter, &observer, &mut pending);

    println!("{}\n", convert::render_conversion(converter));
    println!("{}", ui::style_text("Type 'help' for commands", ui::StyleType::Subtle));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                let step = match parse_action(&line) {
                    Ok(action) => handle(converter, action, &observer, &mut pending),
                    Err(e) => Step::show(error_notice(&e.to_string())),
                };
                if step.quit {
                    break;
                }
                println!("{}\n", step.output);
            }
            Some(completion) = pending.next() => {
                let output = complete(converter, completion, &observer, &mut pending);
                println!("{output}\n");
            }
        }
    }

    for output in drain(converter, &observer, &mut pending).await {
        println!("{output}\n");
    }
    Ok(())
}
