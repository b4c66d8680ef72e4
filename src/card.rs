//! Display text for quote and salary results.
//!
//! Everything the dispatcher returns goes through these helpers, so no
//! raw error or unformatted value ever reaches the chat surface.

use crate::salary::SalaryComputation;
use crate::store::WageRecord;
use chrono::{DateTime, Utc};

/// Thousands-separated amount with two decimals: `1333.333` → `1,333.33`.
pub fn fmt_amount(value: f64) -> String {
    fmt_grouped(value, 2)
}

/// Thousands-separated whole amount: `450000.4` → `450,000`.
pub fn fmt_whole(value: f64) -> String {
    fmt_grouped(value, 0)
}

fn fmt_grouped(value: f64, decimals: usize) -> String {
    let rounded = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match rounded.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (rounded.as_str(), None),
    };

    let mut grouped = String::new();
    let digits = int_part.len();
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (digits - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if value < 0.0 && rounded.chars().any(|c| c != '0' && c != '.') {
        "-"
    } else {
        ""
    };
    match frac_part {
        Some(frac) => format!("{sign}{grouped}.{frac}"),
        None => format!("{sign}{grouped}"),
    }
}

pub fn fmt_ts(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}

pub fn unrecognized(input: &str) -> String {
    format!(
        "Could not recognize a currency or country in '{}'. \
         Try a code like USD, a currency name, or a country name.",
        input.trim()
    )
}

pub fn unrecognized_hint() -> String {
    "Could not recognize a currency or country. \
     Try a code like USD, a currency name, or a country name."
        .to_string()
}

/// Wage-and-cake card, tolerant of absent fields like the wage source.
pub fn salary_card(record: &WageRecord, calc: &SalaryComputation) -> String {
    let country = record.country.as_deref().unwrap_or(&record.iso3);

    let mut lines = vec![
        format!(
            "Residents of {} earn {} cakes a month",
            country,
            fmt_amount(calc.cake_salary)
        ),
        format!(
            "Average salary: {} KZT • {} {}",
            fmt_whole(calc.salary_kzt),
            fmt_amount(record.value),
            record.unit
        ),
    ];

    let source = record.source.clone().unwrap_or_default();
    let src_name = source.name.as_deref().unwrap_or("unknown source");
    let src_year = source.year.unwrap_or(record.year);
    let mut src_line = match &source.url {
        Some(url) => format!("Source: [{src_name}, {src_year}]({url})"),
        None => format!("Source: {src_name}, {src_year}"),
    };
    src_line.push_str(&format!(" (updated: {})", fmt_ts(calc.computed_at)));
    lines.push(src_line);

    lines.join("\n")
}

pub fn wage_missing(iso3: &str, year: i32, unit: &str) -> String {
    format!("No wage data for {iso3} ({year}, {unit}).")
}

pub fn wage_rate_unavailable(reference: &str) -> String {
    format!("Wage service unavailable: no {reference} rate.")
}

pub fn salary_failed(country: &str) -> String {
    format!("Could not compute a cake salary for {country}.")
}
