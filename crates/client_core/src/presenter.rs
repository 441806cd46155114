//! Display formatting for the policy list and form fields.

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use shared::protocol::PolicySummary;

pub const EARLIEST_CAR_YEAR: i32 = 1990;

const GROUP_SEPARATOR: char = '.';
const DECIMAL_SEPARATOR: char = ',';
const WIRE_DATE_FORMAT: &str = "%Y-%m-%d";

/// One rendered row of the policy table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyRow {
    pub policy_number: String,
    pub insured: String,
    pub period: String,
    pub vehicle: String,
    pub car_price: String,
    pub premium_price: String,
}

impl PolicyRow {
    pub fn from_summary(summary: &PolicySummary) -> Self {
        Self {
            policy_number: summary.policy_number.to_string(),
            insured: summary.insured.clone(),
            period: format!(
                "{} - {}",
                format_long_date(&summary.effective_date),
                format_long_date(&summary.expiration_date)
            ),
            vehicle: format!("{} ({})", summary.car_name, summary.car_year),
            car_price: format_rupiah(summary.car_price),
            premium_price: format_rupiah(summary.premium_price),
        }
    }
}

/// Groups thousands with `.` and writes at most two decimals after `,`,
/// e.g. `1234567.5` becomes `1.234.567,5`.
pub fn format_grouped(value: Decimal) -> String {
    let rounded = value
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        .normalize();
    let text = rounded.abs().to_string();
    let (integer, fraction) = match text.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (text.as_str(), None),
    };

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3 + 4);
    if rounded.is_sign_negative() && !rounded.is_zero() {
        grouped.push('-');
    }
    for (index, digit) in integer.chars().enumerate() {
        if index > 0 && (integer.len() - index) % 3 == 0 {
            grouped.push(GROUP_SEPARATOR);
        }
        grouped.push(digit);
    }
    if let Some(fraction) = fraction {
        grouped.push(DECIMAL_SEPARATOR);
        grouped.push_str(fraction);
    }
    grouped
}

/// Whole-rupiah amount as shown in the list, e.g. `Rp 100.000.000`.
pub fn format_rupiah(value: Decimal) -> String {
    format!("Rp {}", format_grouped(value.trunc()))
}

/// `2024-11-14` (optionally followed by a time) becomes `14 November 2024`.
/// Text that is not a date is shown as-is.
pub fn format_long_date(raw: &str) -> String {
    match parse_wire_date(raw) {
        Some(date) => date.format("%-d %B %Y").to_string(),
        None => raw.trim().to_string(),
    }
}

/// Reads `YYYY-MM-DD`, allowing a time part after a space or `T`. Anything
/// else trailing the date makes it unreadable.
pub fn parse_wire_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    let date_part = trimmed
        .split_once([' ', 'T'])
        .map_or(trimmed, |(date, _)| date);
    NaiveDate::parse_from_str(date_part, WIRE_DATE_FORMAT).ok()
}

pub fn car_year_options(current_year: i32) -> Vec<i32> {
    (EARLIEST_CAR_YEAR..=current_year.max(EARLIEST_CAR_YEAR)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::domain::PolicyNumber;

    #[test]
    fn groups_thousands_with_dots() {
        assert_eq!(format_grouped(Decimal::new(100_000_000, 0)), "100.000.000");
        assert_eq!(format_grouped(Decimal::new(999, 0)), "999");
        assert_eq!(format_grouped(Decimal::new(1000, 0)), "1.000");
        assert_eq!(format_grouped(Decimal::ZERO), "0");
    }

    #[test]
    fn keeps_two_decimals_with_comma() {
        assert_eq!(format_grouped(Decimal::new(43209950, 4)), "4.321");
        assert_eq!(format_grouped(Decimal::new(12345675, 1)), "1.234.567,5");
        assert_eq!(format_grouped(Decimal::new(-15005, 1)), "-1.500,5");
    }

    #[test]
    fn formats_long_dates() {
        assert_eq!(format_long_date("2024-11-14"), "14 November 2024");
        assert_eq!(format_long_date("2025-01-05 00:00:00"), "5 January 2025");
        assert_eq!(format_long_date("soon"), "soon");
    }

    #[test]
    fn trailing_junk_is_not_a_date() {
        assert_eq!(
            parse_wire_date("2024-01-01T08:30:00"),
            NaiveDate::from_ymd_opt(2024, 1, 1)
        );
        assert_eq!(parse_wire_date("2024-01-01xyz"), None);
        assert_eq!(format_long_date("2024-01-01xyz"), "2024-01-01xyz");
    }

    #[test]
    fn renders_policy_row() {
        let summary = PolicySummary {
            policy_number: PolicyNumber::new("POL-1"),
            insured: "Budi".to_string(),
            effective_date: "2024-11-14".to_string(),
            expiration_date: "2025-11-14".to_string(),
            car_name: "Toyota - Avanza".to_string(),
            car_year: 2021,
            car_price: Decimal::new(250_000_000, 0),
            premium_price: Decimal::new(87_500_009, 1),
        };
        let row = PolicyRow::from_summary(&summary);
        assert_eq!(row.period, "14 November 2024 - 14 November 2025");
        assert_eq!(row.vehicle, "Toyota - Avanza (2021)");
        assert_eq!(row.car_price, "Rp 250.000.000");
        assert_eq!(row.premium_price, "Rp 8.750.000");
    }

    #[test]
    fn year_options_start_at_1990() {
        let years = car_year_options(1992);
        assert_eq!(years, vec![1990, 1991, 1992]);
        assert_eq!(car_year_options(1980), vec![1990]);
    }
}
