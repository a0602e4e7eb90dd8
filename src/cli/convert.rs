use super::{history, rates, ui};
use crate::core::converter::{Converter, ConverterState};
use crate::core::currency::Currency;
use crate::core::error::ValidationError;
use anyhow::Result;

pub struct ConvertArgs {
    pub amount: String,
    pub from: Currency,
    pub to: Currency,
    pub save: bool,
}

/// Renders the current amounts and the rate that produced them.
pub fn render_conversion(converter: &Converter<'_>) -> String {
    let state = converter.state();
    let from = state.from_currency();
    let to = state.to_currency();
    let to_amount = if state.to_amount().is_empty() {
        "--"
    } else {
        state.to_amount()
    };

    let mut output = format!(
        "{} {} {}  ->  {}\n",
        from.symbol(),
        state.from_amount(),
        from,
        ui::style_text(
            &format!("{} {} {}", to.symbol(), to_amount, to),
            ui::StyleType::Value
        ),
    );
    output.push_str(&ui::style_text(
        &format!("1 {} = {:.4} {}", from, state.rate(), to),
        ui::StyleType::Subtle,
    ));
    if let Some(snapshot) = converter.snapshot() {
        output.push('\n');
        output.push_str(&rates::render_freshness(snapshot));
    }
    output
}

pub async fn run(converter: &mut Converter<'_>, args: ConvertArgs) -> Result<()> {
    let observer = ui::SpinnerObserver::new();
    let outcome = converter.refresh(&observer).await;
    if let Some(e) = &outcome.history_error {
        eprintln!(
            "{}",
            ui::style_text(
                &format!("Could not load conversion history: {e}"),
                ui::StyleType::Error
            )
        );
    }

    let state: &mut ConverterState = converter.state_mut();
    state.set_from_currency(args.from);
    state.set_to_currency(args.to);
    state.set_amount(&args.amount);

    if converter.state().amount().is_none() {
        return Err(ValidationError::InvalidAmount.into());
    }
    println!("{}", render_conversion(converter));

    if !args.save {
        return Ok(());
    }

    converter.confirm(&observer).await?;
    println!(
        "\n{}\n",
        ui::style_text("Conversion saved", ui::StyleType::Success)
    );
    println!("{}", history::render_history(converter.history()));
    Ok(())
}
