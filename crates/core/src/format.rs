//! Display formatting shared by the CLI report and the HTTP payloads.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;

use crate::metrics::round_half_up;

pub const DEFAULT_TRUNCATE_LENGTH: usize = 50;

/// `$1,234.50`; negative amounts render as `-$1,234.50`.
pub fn format_currency(value: Decimal) -> String {
    let rounded = round_half_up(value, 2);
    let body = format!("{:.2}", rounded.abs());
    let (whole, fraction) = body.split_once('.').unwrap_or((body.as_str(), "00"));
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };

    format!("{sign}${}.{fraction}", group_thousands(whole))
}

/// Renders a fraction as a percent with a fixed number of decimals.
pub fn format_percent(fraction: Decimal, decimals: u32) -> String {
    let percent = round_half_up(fraction * Decimal::ONE_HUNDRED, decimals);
    format!("{:.*}%", decimals as usize, percent)
}

/// Thousands separators with at most three fractional digits.
pub fn format_number(value: Decimal) -> String {
    let rounded = round_half_up(value, 3).normalize();
    let body = rounded.abs().to_string();
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };

    match body.split_once('.') {
        Some((whole, fraction)) => format!("{sign}{}.{fraction}", group_thousands(whole)),
        None => format!("{sign}{}", group_thousands(&body)),
    }
}

/// `Jan 15, 2024`, `N/A` for blank input and `Invalid Date` when unparseable.
pub fn format_date(input: &str) -> String {
    if input.trim().is_empty() {
        return "N/A".to_string();
    }
    match parse_timestamp(input) {
        Some(timestamp) => timestamp.format("%b %-d, %Y").to_string(),
        None => "Invalid Date".to_string(),
    }
}

/// `Jan 15, 2024, 02:30 PM`.
pub fn format_date_time(input: &str) -> String {
    if input.trim().is_empty() {
        return "N/A".to_string();
    }
    match parse_timestamp(input) {
        Some(timestamp) => timestamp.format("%b %-d, %Y, %I:%M %p").to_string(),
        None => "Invalid Date".to_string(),
    }
}

pub fn truncate_text(text: &str, max_length: usize) -> String {
    if text.chars().count() <= max_length {
        return text.to_string();
    }
    let head: String = text.chars().take(max_length).collect();
    format!("{head}...")
}

fn parse_timestamp(input: &str) -> Option<NaiveDateTime> {
    let input = input.trim();
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(input) {
        return Some(timestamp.naive_local());
    }
    if let Ok(timestamp) = NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(timestamp);
    }
    if let Ok(timestamp) = NaiveDateTime::parse_from_str(input, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(timestamp);
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d").ok().and_then(|date| date.and_hms_opt(0, 0, 0))
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}
