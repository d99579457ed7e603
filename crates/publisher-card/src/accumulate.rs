//! Accumulation engine
//!
//! Derives every computed cell value from the yearly record: per-month cell
//! texts and checkbox states, the annual hours total, and the sum of numeric
//! substrings embedded in free-text remarks. Pure, no I/O.
//!
//! Rendering follows the template's blank-cell convention: a zero count is
//! the empty string, never "0".

use crate::record::{Division, ServiceMonth, YearlyRecord};
use regex::Regex;
use std::sync::OnceLock;

/// Numerals with optional comma grouping and decimal fraction, e.g. "1,234.5"
fn numeral_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"-?\d[\d,]*(?:\.\d+)?").expect("valid numeral pattern"))
}

/// Computed cell values for one month's table row
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonthCells {
    pub participated: bool,
    pub assistant_pioneer: bool,
    pub studies: String,
    pub hours: String,
    pub remarks: String,
}

/// Everything the document writer needs, per month plus annual aggregates
#[derive(Debug, Clone, PartialEq)]
pub struct Accumulated {
    /// Cells for the twelve canonical months, in service-year order
    pub months: Vec<(ServiceMonth, MonthCells)>,
    /// Annual hours total, blank when zero
    pub total_hours: String,
    /// Sum of numerals embedded in remarks texts, blank when zero
    pub total_remarks: String,
}

/// Derive all computed values from a yearly record
///
/// Months absent from the record are treated as all-zero rows, not errors.
pub fn accumulate(record: &YearlyRecord) -> Accumulated {
    let mut months = Vec::with_capacity(12);
    let mut total_hours: u64 = 0;
    let mut remarks_sum = 0.0;

    for month in ServiceMonth::ALL {
        let cells = match record.month(month) {
            Some(entry) => {
                total_hours += u64::from(entry.hours);
                remarks_sum += remarks_numerals(&entry.remarks);
                MonthCells {
                    participated: entry.participated,
                    assistant_pioneer: entry.division == Division::AssistantPioneer,
                    studies: count_text(entry.bible_studies),
                    hours: count_text(entry.hours),
                    remarks: entry.remarks.clone(),
                }
            }
            None => MonthCells::default(),
        };
        months.push((month, cells));
    }

    Accumulated {
        months,
        total_hours: count_text_u64(total_hours),
        total_remarks: sum_text(remarks_sum),
    }
}

/// Sum every numeric substring in a remarks text; text without numerals
/// contributes zero
fn remarks_numerals(text: &str) -> f64 {
    numeral_pattern()
        .find_iter(text)
        .filter_map(|m| m.as_str().replace(',', "").parse::<f64>().ok())
        .sum()
}

fn count_text(value: u32) -> String {
    if value == 0 {
        String::new()
    } else {
        value.to_string()
    }
}

fn count_text_u64(value: u64) -> String {
    if value == 0 {
        String::new()
    } else {
        value.to_string()
    }
}

/// Format a float sum the way a calculator display would: no trailing ".0",
/// blank when not positive
fn sum_text(value: f64) -> String {
    if value <= 0.0 {
        String::new()
    } else if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}
