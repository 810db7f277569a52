//! The built-in macro table.

use std::sync::LazyLock;

use chrono::Local;
use serde_json::Value;

use super::{MacroRegistry, MacroSpec};

static DEFAULT_MACROS: LazyLock<MacroRegistry> = LazyLock::new(|| {
    [
        date_macro("today", "%Y%m%d", "Today's date, formatted as yyyymmdd"),
        date_macro("today:1", "%Y%m%d", "Today's date, formatted as yyyymmdd"),
        date_macro("today:2", "%Y-%m-%d", "Today's date, formatted as yyyy-mm-dd"),
        date_macro("year:1", "%Y", "The current year, formatted as yyyy"),
    ]
    .into_iter()
    .flatten()
    .collect()
});

fn date_macro(name: &str, format: &'static str, description: &str) -> Option<MacroSpec> {
    MacroSpec::producer(name, move || Value::String(Local::now().format(format).to_string()))
        .ok()
        .map(|spec| spec.with_description(description))
}

/// The immutable default macros, evaluated against local wall-clock time.
///
/// Callers layer their own definitions on top with
/// [`MacroRegistry::merged_with`]; the table itself is never modified.
pub fn default_macros() -> &'static MacroRegistry {
    &DEFAULT_MACROS
}
