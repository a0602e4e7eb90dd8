use super::ui;
use crate::core::conversion::{ConversionRecord, ConversionRecorder};
use anyhow::{Context, Result};
use chrono::Local;
use comfy_table::Cell;

pub fn render_history(records: &[ConversionRecord]) -> String {
    let title = ui::style_text("Conversion history", ui::StyleType::Title);
    if records.is_empty() {
        return format!(
            "{title}\n\n{}",
            ui::style_text("No conversions yet", ui::StyleType::Subtle)
        );
    }

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("From"),
        ui::header_cell("To"),
        ui::header_cell("Rate"),
        ui::header_cell("Date"),
    ]);

    for record in records {
        let date = record
            .conversion_date
            .with_timezone(&Local)
            .format("%d/%m %H:%M");
        table.add_row(vec![
            ui::right_cell(format!(
                "{} {:.2}",
                record.from_currency.symbol(),
                record.from_amount
            )),
            ui::right_cell(format!(
                "{} {:.2}",
                record.to_currency.symbol(),
                record.to_amount
            )),
            ui::right_cell(format!("{:.4}", record.exchange_rate)),
            Cell::new(date.to_string()),
        ]);
    }

    format!("{title}\n\n{table}")
}

pub async fn run(recorder: &dyn ConversionRecorder, limit: usize) -> Result<()> {
    let records = recorder
        .list_recent(limit)
        .await
        .context("Failed to load conversion history")?;
    println!("{}", render_history(&records));
    Ok(())
}
