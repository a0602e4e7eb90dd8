use super::ui;
use crate::core::currency::RatePair;
use crate::core::rates::{RateProvider, RateSnapshot, refresh_rates};
use anyhow::Result;
use chrono::Local;
use comfy_table::Cell;

pub fn render_rates(snapshot: &RateSnapshot) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Pair"), ui::header_cell("Rate")]);

    for pair in RatePair::ALL {
        let rate = snapshot
            .table
            .get(pair)
            .map_or_else(ui::na_cell, |r| ui::right_cell(format!("{r:.4}")));
        table.add_row(vec![Cell::new(pair.to_string()), rate]);
    }

    let mut output = format!(
        "{}\n{}\n\n",
        ui::style_text("Current exchange rates", ui::StyleType::Title),
        render_freshness(snapshot)
    );
    output.push_str(&table.to_string());
    output
}

/// One line telling when rates were last refreshed and whether they are live.
pub fn render_freshness(snapshot: &RateSnapshot) -> String {
    let updated = snapshot
        .updated_at
        .with_timezone(&Local)
        .format("%d/%m/%Y %H:%M");
    let line = format!("Updated: {updated}");
    if snapshot.is_fallback() {
        format!(
            "{} {}",
            ui::style_text(&line, ui::StyleType::Subtle),
            ui::style_text(
                "(fallback rates, live quotes unavailable)",
                ui::StyleType::Error
            )
        )
    } else {
        ui::style_text(&line, ui::StyleType::Subtle)
    }
}

pub async fn run(provider: &dyn RateProvider) -> Result<()> {
    let spinner = ui::new_spinner("Fetching exchange rates...");
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));
    let snapshot = refresh_rates(provider).await;
    spinner.finish_and_clear();

    println!("{}", render_rates(&snapshot));
    Ok(())
}
