//! Working copy of a policy while a modal is open.

use std::{collections::BTreeMap, fmt};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use shared::{
    domain::{join_car_name, BrandId, CarBrand, CarType, CarTypeId, PolicyNumber, PremiumRate},
    protocol::{CreatePolicyForm, PolicyDetail, PolicySummary, UpdatePolicyRequest},
};

use crate::{
    premium::{parse_price, premium_for, RateInput},
    presenter::{format_grouped, parse_wire_date},
    AuthContext,
};

pub const REQUIRED_MESSAGE: &str = "This field is required";
pub const COVERAGE_MESSAGE: &str = "Coverage period is less than the required minimum";
pub const INVALID_DATE_MESSAGE: &str = "Invalid date, expected YYYY-MM-DD";
pub const INVALID_YEAR_MESSAGE: &str = "Invalid year";

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PolicyField {
    PolicyNumber,
    Insured,
    EffectiveDate,
    ExpirationDate,
    CarBrand,
    CarType,
    CarYear,
    CarPrice,
    PremiumRate,
    PremiumPrice,
}

impl PolicyField {
    pub const REQUIRED: [PolicyField; 9] = [
        PolicyField::Insured,
        PolicyField::EffectiveDate,
        PolicyField::ExpirationDate,
        PolicyField::CarBrand,
        PolicyField::CarType,
        PolicyField::CarYear,
        PolicyField::CarPrice,
        PolicyField::PremiumRate,
        PolicyField::PremiumPrice,
    ];

    /// Field name as used on the wire.
    pub fn name(self) -> &'static str {
        match self {
            Self::PolicyNumber => "policy_number",
            Self::Insured => "insured",
            Self::EffectiveDate => "effective_date",
            Self::ExpirationDate => "expiration_date",
            Self::CarBrand => "car_brand",
            Self::CarType => "car_type",
            Self::CarYear => "car_year",
            Self::CarPrice => "car_price",
            Self::PremiumRate => "premium_rate",
            Self::PremiumPrice => "premium_price",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::PolicyNumber => "Policy number",
            Self::Insured => "Insured name",
            Self::EffectiveDate => "Effective date",
            Self::ExpirationDate => "Expiration date",
            Self::CarBrand => "Vehicle brand",
            Self::CarType => "Vehicle type",
            Self::CarYear => "Vehicle year",
            Self::CarPrice => "Vehicle price",
            Self::PremiumRate => "Premium rate",
            Self::PremiumPrice => "Premium price",
        }
    }
}

impl fmt::Display for PolicyField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub type ErrorMap = BTreeMap<PolicyField, String>;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FormState {
    pub policy_number: PolicyNumber,
    pub insured: String,
    pub effective_date: String,
    pub expiration_date: String,
    pub car_brand: BrandId,
    pub car_type: CarTypeId,
    pub car_year: String,
    pub car_price: String,
    pub premium_rate: Option<RateInput>,
    pub premium_price: Decimal,
    errors: ErrorMap,
}

impl FormState {
    /// Blank form for the Add flow.
    pub fn for_new_policy(current_year: i32) -> Self {
        Self {
            car_year: current_year.to_string(),
            ..Self::default()
        }
    }

    /// Editable copy of a stored policy. The stored premium is kept as-is
    /// until the price or rate is touched.
    pub fn from_detail(detail: &PolicyDetail) -> Self {
        let summary = &detail.summary;
        let premium_rate = if !detail.premium_rate_uid.is_empty() {
            Some(RateInput::Reference(detail.premium_rate_uid.clone()))
        } else if detail.premium_rate > Decimal::ZERO {
            Some(RateInput::Literal(detail.premium_rate))
        } else {
            None
        };

        Self {
            policy_number: summary.policy_number.clone(),
            insured: summary.insured.clone(),
            effective_date: summary.effective_date.clone(),
            expiration_date: summary.expiration_date.clone(),
            car_brand: detail.car_brand_uid.clone(),
            car_type: detail.car_type_uid.clone(),
            car_year: summary.car_year.to_string(),
            car_price: if summary.car_price.is_zero() {
                String::new()
            } else {
                format_grouped(summary.car_price.trunc())
            },
            premium_rate,
            premium_price: summary.premium_price,
            errors: ErrorMap::new(),
        }
    }

    pub fn error(&self, field: PolicyField) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    /// Clears the message for a field the user just edited.
    pub fn touch(&mut self, field: PolicyField) {
        self.errors.remove(&field);
    }

    /// Switches brand; the previously chosen type belongs to the old brand and
    /// is dropped. Returns whether the brand actually changed.
    pub fn select_brand(&mut self, brand: BrandId) -> bool {
        self.touch(PolicyField::CarBrand);
        if self.car_brand == brand {
            return false;
        }
        self.car_brand = brand;
        self.car_type = CarTypeId::default();
        true
    }

    pub fn select_car_type(&mut self, car_type: CarTypeId) {
        self.touch(PolicyField::CarType);
        self.car_type = car_type;
    }

    pub fn set_car_price(&mut self, raw: &str, rates: &[PremiumRate]) {
        self.touch(PolicyField::CarPrice);
        self.car_price = raw.to_string();
        self.recompute_premium(rates);
    }

    /// Rewrites the price with thousands grouping and re-derives the premium.
    pub fn reformat_car_price(&mut self, rates: &[PremiumRate]) {
        let value = parse_price(&self.car_price);
        self.car_price = if self.car_price.chars().any(|c| c.is_ascii_digit()) {
            format_grouped(value)
        } else {
            String::new()
        };
        self.recompute_premium(rates);
    }

    pub fn set_premium_rate(&mut self, rate: Option<RateInput>, rates: &[PremiumRate]) {
        self.touch(PolicyField::PremiumRate);
        self.premium_rate = rate;
        self.recompute_premium(rates);
    }

    pub fn recompute_premium(&mut self, rates: &[PremiumRate]) {
        self.premium_price = match &self.premium_rate {
            Some(rate) => premium_for(self.car_price_value(), rate, rates),
            None => Decimal::ZERO,
        };
        if !self.premium_price.is_zero() {
            self.touch(PolicyField::PremiumPrice);
        }
    }

    pub fn car_price_value(&self) -> Decimal {
        parse_price(&self.car_price)
    }

    fn is_blank(&self, field: PolicyField) -> bool {
        match field {
            PolicyField::PolicyNumber => self.policy_number.is_empty(),
            PolicyField::Insured => self.insured.trim().is_empty(),
            PolicyField::EffectiveDate => self.effective_date.trim().is_empty(),
            PolicyField::ExpirationDate => self.expiration_date.trim().is_empty(),
            PolicyField::CarBrand => self.car_brand.is_empty(),
            PolicyField::CarType => self.car_type.is_empty(),
            PolicyField::CarYear => self.car_year.trim().is_empty(),
            PolicyField::CarPrice => self.car_price_value().is_zero(),
            PolicyField::PremiumRate => self.premium_rate.is_none(),
            PolicyField::PremiumPrice => self.premium_price.is_zero(),
        }
    }

    /// Presence checks plus the coverage-period rule. An empty map means the
    /// form can be submitted.
    pub fn validate(&self) -> ErrorMap {
        let mut errors = ErrorMap::new();
        for field in PolicyField::REQUIRED {
            if self.is_blank(field) {
                errors.insert(field, REQUIRED_MESSAGE.to_string());
            }
        }

        let effective = self.parsed_date(PolicyField::EffectiveDate, &mut errors);
        let expiration = self.parsed_date(PolicyField::ExpirationDate, &mut errors);
        if let (Some(effective), Some(expiration)) = (effective, expiration) {
            if expiration <= effective {
                errors.insert(PolicyField::ExpirationDate, COVERAGE_MESSAGE.to_string());
            }
        }

        if !self.is_blank(PolicyField::CarYear) && self.car_year.trim().parse::<i32>().is_err() {
            errors.insert(PolicyField::CarYear, INVALID_YEAR_MESSAGE.to_string());
        }

        errors
    }

    fn parsed_date(&self, field: PolicyField, errors: &mut ErrorMap) -> Option<NaiveDate> {
        let raw = match field {
            PolicyField::EffectiveDate => &self.effective_date,
            PolicyField::ExpirationDate => &self.expiration_date,
            _ => return None,
        };
        if raw.trim().is_empty() {
            return None;
        }
        match parse_date(raw) {
            Some(date) => Some(date),
            None => {
                errors.insert(field, INVALID_DATE_MESSAGE.to_string());
                None
            }
        }
    }

    /// Gate for submission: a [`ValidForm`] can only be obtained from a form
    /// that passes [`FormState::validate`].
    pub fn to_valid(&self) -> Result<ValidForm, ErrorMap> {
        let errors = self.validate();
        if !errors.is_empty() {
            return Err(errors);
        }

        let effective_date = parse_date(&self.effective_date);
        let expiration_date = parse_date(&self.expiration_date);
        let car_year = self.car_year.trim().parse::<i32>().ok();
        let premium_rate = self.premium_rate.clone();
        match (effective_date, expiration_date, car_year, premium_rate) {
            (Some(effective_date), Some(expiration_date), Some(car_year), Some(premium_rate)) => {
                Ok(ValidForm {
                    policy_number: self.policy_number.clone(),
                    insured: self.insured.trim().to_string(),
                    effective_date,
                    expiration_date,
                    car_brand: self.car_brand.clone(),
                    car_type: self.car_type.clone(),
                    car_year,
                    car_price: self.car_price_value(),
                    premium_rate,
                    premium_price: self.premium_price,
                })
            }
            _ => Err(ErrorMap::from([(
                PolicyField::PremiumRate,
                REQUIRED_MESSAGE.to_string(),
            )])),
        }
    }

    /// Runs the gate and keeps the resulting messages for inline display.
    pub fn check(&mut self) -> Result<ValidForm, ErrorMap> {
        let outcome = self.to_valid();
        self.errors = match &outcome {
            Ok(_) => ErrorMap::new(),
            Err(errors) => errors.clone(),
        };
        outcome
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    parse_wire_date(raw)
}

/// A form that passed validation, with every field in its typed shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidForm {
    pub policy_number: PolicyNumber,
    pub insured: String,
    pub effective_date: NaiveDate,
    pub expiration_date: NaiveDate,
    pub car_brand: BrandId,
    pub car_type: CarTypeId,
    pub car_year: i32,
    pub car_price: Decimal,
    pub premium_rate: RateInput,
    pub premium_price: Decimal,
}

impl ValidForm {
    pub fn to_create_form(&self, auth: &AuthContext) -> CreatePolicyForm {
        CreatePolicyForm {
            policy_number: self.policy_number.clone(),
            insured: self.insured.clone(),
            effective_date: self.effective_date.format(DATE_FORMAT).to_string(),
            expiration_date: self.expiration_date.format(DATE_FORMAT).to_string(),
            car_brand: self.car_brand.clone(),
            car_type: self.car_type.clone(),
            car_year: self.car_year,
            car_price: self.car_price,
            premium_rate: self.premium_rate.wire_value(),
            premium_price: self.premium_price,
            created_by: auth.actor().clone(),
        }
    }

    pub fn to_update_request(&self, auth: &AuthContext) -> UpdatePolicyRequest {
        UpdatePolicyRequest {
            policy_number: self.policy_number.clone(),
            insured: self.insured.clone(),
            effective_date: self.effective_date.format(DATE_FORMAT).to_string(),
            expiration_date: self.expiration_date.format(DATE_FORMAT).to_string(),
            car_brand: self.car_brand.clone(),
            car_type: self.car_type.clone(),
            car_year: self.car_year,
            car_price: self.car_price,
            premium_rate: self.premium_rate.wire_value(),
            premium_price: self.premium_price,
            updated_by: auth.actor().clone(),
        }
    }

    /// Local list row for a record the service just accepted. Brand and type
    /// names come from the reference data; unknown ids fall back to the id.
    pub fn to_summary(&self, brands: &[CarBrand], car_types: &[CarType]) -> PolicySummary {
        let brand_name = brands
            .iter()
            .find(|brand| brand.uid == self.car_brand)
            .map(|brand| brand.name.clone())
            .unwrap_or_else(|| self.car_brand.to_string());
        let type_name = car_types
            .iter()
            .find(|car_type| car_type.uid == self.car_type)
            .map(|car_type| car_type.name.clone())
            .unwrap_or_else(|| self.car_type.to_string());

        PolicySummary {
            policy_number: self.policy_number.clone(),
            insured: self.insured.clone(),
            effective_date: self.effective_date.format(DATE_FORMAT).to_string(),
            expiration_date: self.expiration_date.format(DATE_FORMAT).to_string(),
            car_name: join_car_name(&brand_name, &type_name),
            car_year: self.car_year,
            car_price: self.car_price,
            premium_price: self.premium_price,
        }
    }
}

#[cfg(test)]
#[path = "tests/form_tests.rs"]
mod tests;
