use crate::core::converter::{Activity, LoadObserver};
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use console::style;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// Defines different styles for text elements.
pub enum StyleType {
    Title,
    Value,
    Success,
    Error,
    Subtle,
}

/// Applies a consistent style to a string.
pub fn style_text(text: &str, style_type: StyleType) -> String {
    let styled = match style_type {
        StyleType::Title => style(text).bold().underlined(),
        StyleType::Value => style(text).green().bold(),
        StyleType::Success => style(text).green(),
        StyleType::Error => style(text).red(),
        StyleType::Subtle => style(text).dim(),
    };
    styled.to_string()
}

/// Creates a new `comfy_table::Table` with standard styling.
pub fn new_styled_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Creates a styled header cell for a table.
pub fn header_cell(text: &str) -> Cell {
    Cell::new(text)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

pub fn right_cell(text: String) -> Cell {
    Cell::new(text).set_alignment(CellAlignment::Right)
}

/// Creates a cell for missing values.
pub fn na_cell() -> Cell {
    Cell::new("--")
        .fg(Color::DarkGrey)
        .set_alignment(CellAlignment::Right)
}

/// Creates a new spinner for an operation of unknown length.
pub fn new_spinner(message: &'static str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message);
    pb
}

/// Shows one spinner per loading activity while any load of that kind runs.
pub struct SpinnerObserver {
    multi: MultiProgress,
    active: Mutex<HashMap<Activity, (ProgressBar, usize)>>,
}

impl SpinnerObserver {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            active: Mutex::new(HashMap::new()),
        }
    }
}

fn activity_message(activity: Activity) -> &'static str {
    match activity {
        Activity::Rates => "Fetching exchange rates...",
        Activity::History => "Loading conversion history...",
        Activity::Conversion => "Saving conversion...",
    }
}

impl Default for SpinnerObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl LoadObserver for SpinnerObserver {
    fn started(&self, activity: Activity) {
        let Ok(mut active) = self.active.lock() else {
            return;
        };
        let (_, count) = active.entry(activity).or_insert_with(|| {
            let spinner = self.multi.add(new_spinner(activity_message(activity)));
            spinner.enable_steady_tick(Duration::from_millis(100));
            (spinner, 0)
        });
        *count += 1;
    }

    fn finished(&self, activity: Activity) {
        let Ok(mut active) = self.active.lock() else {
            return;
        };
        if let Some((spinner, count)) = active.get_mut(&activity) {
            *count -= 1;
            if *count == 0 {
                spinner.finish_and_clear();
                active.remove(&activity);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spinner_clears_after_last_load_of_a_kind() {
        let observer = SpinnerObserver::new();
        observer.started(Activity::Rates);
        observer.started(Activity::Rates);
        observer.started(Activity::Conversion);

        observer.finished(Activity::Rates);
        assert!(observer.active.lock().unwrap().contains_key(&Activity::Rates));

        observer.finished(Activity::Rates);
        observer.finished(Activity::Conversion);
        assert!(observer.active.lock().unwrap().is_empty());

        observer.finished(Activity::History);
    }
}
