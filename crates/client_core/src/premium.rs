//! Premium derivation from a vehicle price and a rate.
//!
//! A rate reaches the calculator in one of two shapes: a percentage typed by
//! the user, or the uid of a [`PremiumRate`] picked from the reference list.
//! [`RateInput::resolve`] is the only place raw text is interpreted; everything
//! past that boundary works with the tagged value.

use std::str::FromStr;

use rust_decimal::Decimal;
use shared::domain::{PremiumRate, RateId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateInput {
    /// Percentage entered directly, e.g. `3.5` for 3.5%.
    Literal(Decimal),
    /// Uid of a loaded premium rate.
    Reference(RateId),
}

impl RateInput {
    /// Converts raw UI text into a rate.
    ///
    /// Resolution order: a uid present in `rates` wins, then a positive number
    /// without alphabetic characters is a literal percentage, and anything else
    /// is kept as an (unresolvable) reference. Empty text is no rate at all.
    pub fn resolve(raw: &str, rates: &[PremiumRate]) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        if rates.iter().any(|rate| rate.uid.as_str() == trimmed) {
            return Some(Self::Reference(RateId::new(trimmed)));
        }
        if !trimmed.chars().any(char::is_alphabetic) {
            if let Some(percentage) = parse_percentage(trimmed) {
                return Some(Self::Literal(percentage));
            }
        }
        Some(Self::Reference(RateId::new(trimmed)))
    }

    /// Effective percentage; an unknown reference counts as zero.
    pub fn percentage(&self, rates: &[PremiumRate]) -> Decimal {
        match self {
            Self::Literal(percentage) => *percentage,
            Self::Reference(rate_id) => rates
                .iter()
                .find(|rate| &rate.uid == rate_id)
                .map(|rate| rate.rate)
                .unwrap_or(Decimal::ZERO),
        }
    }

    /// Value submitted to the service in the `premium_rate` field.
    pub fn wire_value(&self) -> String {
        match self {
            Self::Literal(percentage) => percentage.normalize().to_string(),
            Self::Reference(rate_id) => rate_id.to_string(),
        }
    }

    pub fn label(&self, rates: &[PremiumRate]) -> String {
        match self {
            Self::Literal(percentage) => format!("{}%", percentage.normalize()),
            Self::Reference(rate_id) => match rates.iter().find(|rate| &rate.uid == rate_id) {
                Some(rate) => format!("{}%", rate.rate.normalize()),
                None => format!("unknown rate {rate_id}"),
            },
        }
    }
}

/// Accepts `3.5` as well as the comma decimal form `3,5`. Zero and negative
/// values are not usable percentages.
fn parse_percentage(raw: &str) -> Option<Decimal> {
    Decimal::from_str(&raw.replace(',', "."))
        .ok()
        .filter(|value| value.is_sign_positive() && !value.is_zero())
}

/// Reads a vehicle price typed with grouping separators. Every non-digit is
/// dropped, so `"100.000.000"` is one hundred million and junk reads as zero.
/// Prices are whole rupiah: anything after the `,` decimal separator is ignored.
pub fn parse_price(raw: &str) -> Decimal {
    let whole = raw.split_once(',').map_or(raw, |(whole, _)| whole);
    let digits: String = whole.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return Decimal::ZERO;
    }
    Decimal::from_str(&digits).unwrap_or(Decimal::ZERO)
}

pub fn premium_for(car_price: Decimal, rate: &RateInput, rates: &[PremiumRate]) -> Decimal {
    car_price
        .checked_mul(rate.percentage(rates))
        .and_then(|scaled| scaled.checked_div(Decimal::ONE_HUNDRED))
        .unwrap_or(Decimal::ZERO)
}

/// `car_price * rate / 100` over raw UI text.
pub fn compute_premium(car_price: &str, rate_input: &str, rates: &[PremiumRate]) -> Decimal {
    match RateInput::resolve(rate_input, rates) {
        Some(rate) => premium_for(parse_price(car_price), &rate, rates),
        None => Decimal::ZERO,
    }
}
