use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{ActorId, BrandId, CarTypeId, PolicyNumber, RateId};

/// Uniform response wrapper returned by every Policy Service endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    #[serde(rename = "StatusCode", with = "lenient::status_code")]
    pub status_code: u16,
    #[serde(rename = "Status", skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(rename = "Message", skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(rename = "Data", skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    pub fn succeeded_with(&self, expected: u16) -> bool {
        self.status_code == expected
    }

    /// Server-provided explanation, preferring `Message` over `Status`.
    pub fn failure_message(&self) -> String {
        self.message
            .as_deref()
            .or(self.status.as_deref())
            .map(str::to_string)
            .unwrap_or_else(|| format!("request failed with status code {}", self.status_code))
    }
}

/// Payload shape for endpoints that return either one record or a list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::Many(items) => items,
            Self::One(item) => vec![item],
        }
    }
}

/// A policy as it appears in the collection listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicySummary {
    pub policy_number: PolicyNumber,
    #[serde(default, with = "lenient::text")]
    pub insured: String,
    #[serde(default, with = "lenient::text")]
    pub effective_date: String,
    #[serde(default, with = "lenient::text")]
    pub expiration_date: String,
    #[serde(default, with = "lenient::text")]
    pub car_name: String,
    #[serde(default, with = "lenient::year")]
    pub car_year: i32,
    #[serde(default, with = "lenient::amount")]
    pub car_price: Decimal,
    #[serde(default, with = "lenient::amount")]
    pub premium_price: Decimal,
}

/// A single policy fetched by number; carries the identifiers the edit form needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyDetail {
    #[serde(flatten)]
    pub summary: PolicySummary,
    #[serde(default)]
    pub car_brand_uid: BrandId,
    #[serde(default)]
    pub car_type_uid: CarTypeId,
    #[serde(default)]
    pub premium_rate_uid: RateId,
    #[serde(default, with = "lenient::amount")]
    pub premium_rate: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPolicyNumber {
    pub policy_number: PolicyNumber,
}

/// Form-encoded body of `POST /policies`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePolicyForm {
    pub policy_number: PolicyNumber,
    pub insured: String,
    pub effective_date: String,
    pub expiration_date: String,
    pub car_brand: BrandId,
    pub car_type: CarTypeId,
    pub car_year: i32,
    #[serde(with = "lenient::amount")]
    pub car_price: Decimal,
    pub premium_rate: String,
    #[serde(with = "lenient::amount")]
    pub premium_price: Decimal,
    pub created_by: ActorId,
}

/// JSON body of `PUT /policies`; always the full record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdatePolicyRequest {
    pub policy_number: PolicyNumber,
    pub insured: String,
    pub effective_date: String,
    pub expiration_date: String,
    pub car_brand: BrandId,
    pub car_type: CarTypeId,
    pub car_year: i32,
    #[serde(with = "lenient::amount")]
    pub car_price: Decimal,
    pub premium_rate: String,
    #[serde(with = "lenient::amount")]
    pub premium_price: Decimal,
    pub updated_by: ActorId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletePolicyRequest {
    pub policy_number: PolicyNumber,
}

/// Serde adapters for a service that mixes JSON numbers, numeric strings and nulls.
pub mod lenient {
    use std::str::FromStr;

    use rust_decimal::Decimal;

    /// Parses an amount the way the service writes it: a plain decimal, or digits
    /// wrapped in grouping/currency noise. Anything else reads as zero.
    pub fn parse_wire_amount(raw: &str) -> Decimal {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Decimal::ZERO;
        }
        if let Ok(value) = Decimal::from_str(trimmed) {
            return value;
        }
        let digits: String = trimmed.chars().filter(char::is_ascii_digit).collect();
        Decimal::from_str(&digits).unwrap_or(Decimal::ZERO)
    }

    fn number_to_decimal(number: &serde_json::Number) -> Decimal {
        let text = number.to_string();
        Decimal::from_str(&text)
            .or_else(|_| Decimal::from_scientific(&text))
            .unwrap_or(Decimal::ZERO)
    }

    pub mod amount {
        use rust_decimal::Decimal;
        use serde::{Deserialize, Deserializer, Serializer};
        use serde_json::Value;

        pub fn serialize<S: Serializer>(value: &Decimal, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.collect_str(&value.normalize())
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Decimal, D::Error> {
            Ok(match Value::deserialize(deserializer)? {
                Value::String(raw) => super::parse_wire_amount(&raw),
                Value::Number(number) => super::number_to_decimal(&number),
                _ => Decimal::ZERO,
            })
        }
    }

    pub mod year {
        use serde::{Deserialize, Deserializer, Serializer};
        use serde_json::Value;

        pub fn serialize<S: Serializer>(value: &i32, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.serialize_i32(*value)
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i32, D::Error> {
            Ok(match Value::deserialize(deserializer)? {
                Value::String(raw) => raw.trim().parse().unwrap_or_default(),
                Value::Number(number) => number
                    .as_i64()
                    .and_then(|value| i32::try_from(value).ok())
                    .unwrap_or_default(),
                _ => 0,
            })
        }
    }

    pub mod text {
        use serde::{Deserialize, Deserializer, Serializer};
        use serde_json::Value;

        pub fn serialize<S: Serializer>(value: &str, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.serialize_str(value)
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
            Ok(match Value::deserialize(deserializer)? {
                Value::String(raw) => raw,
                Value::Null => String::new(),
                other => other.to_string(),
            })
        }
    }

    pub mod status_code {
        use serde::{de::Error as _, Deserialize, Deserializer, Serializer};
        use serde_json::Value;

        pub fn serialize<S: Serializer>(value: &u16, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.serialize_u16(*value)
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u16, D::Error> {
            let value = Value::deserialize(deserializer)?;
            let parsed = match &value {
                Value::Number(number) => number.as_u64().and_then(|code| u16::try_from(code).ok()),
                Value::String(raw) => raw.trim().parse().ok(),
                _ => None,
            };
            parsed.ok_or_else(|| D::Error::custom(format!("invalid StatusCode: {value}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_reads_service_casing() {
        let raw = r#"{"StatusCode":200,"Status":"OK","Data":{"policy_number":"POL-1"}}"#;
        let envelope: Envelope<NewPolicyNumber> = serde_json::from_str(raw).expect("envelope");
        assert!(envelope.succeeded_with(200));
        assert_eq!(
            envelope.data.expect("data").policy_number,
            PolicyNumber::new("POL-1")
        );
    }

    #[test]
    fn failure_message_prefers_message_then_status() {
        let envelope: Envelope<()> =
            serde_json::from_str(r#"{"StatusCode":400,"Status":"Bad","Message":"duplicate"}"#)
                .expect("envelope");
        assert_eq!(envelope.failure_message(), "duplicate");

        let envelope: Envelope<()> =
            serde_json::from_str(r#"{"StatusCode":"500","Status":"Server down"}"#)
                .expect("envelope");
        assert_eq!(envelope.status_code, 500);
        assert_eq!(envelope.failure_message(), "Server down");

        let envelope: Envelope<()> =
            serde_json::from_str(r#"{"StatusCode":404}"#).expect("envelope");
        assert_eq!(
            envelope.failure_message(),
            "request failed with status code 404"
        );
    }

    #[test]
    fn one_or_many_normalizes_single_object() {
        let one: OneOrMany<NewPolicyNumber> =
            serde_json::from_str(r#"{"policy_number":"A"}"#).expect("one");
        assert_eq!(one.into_vec().len(), 1);
        let many: OneOrMany<NewPolicyNumber> =
            serde_json::from_str(r#"[{"policy_number":"A"},{"policy_number":"B"}]"#)
                .expect("many");
        assert_eq!(many.into_vec().len(), 2);
    }

    #[test]
    fn summary_accepts_numeric_strings() {
        let raw = r#"{
            "policy_number":"POL-9",
            "insured":"Budi",
            "effective_date":"2024-01-01",
            "expiration_date":"2025-01-01",
            "car_name":"Toyota - Avanza",
            "car_year":"2021",
            "car_price":"250000000",
            "premium_price":8750000
        }"#;
        let summary: PolicySummary = serde_json::from_str(raw).expect("summary");
        assert_eq!(summary.car_year, 2021);
        assert_eq!(summary.car_price, Decimal::new(250_000_000, 0));
        assert_eq!(summary.premium_price, Decimal::new(8_750_000, 0));
    }

    #[test]
    fn detail_flattens_summary_and_identifiers() {
        let raw = r#"{
            "policy_number":"POL-9",
            "insured":"Budi",
            "effective_date":"2024-01-01",
            "expiration_date":"2025-01-01",
            "car_name":"Toyota - Avanza",
            "car_year":2021,
            "car_price":"250000000.00",
            "premium_price":"8750000",
            "car_brand_uid":"b1",
            "car_type_uid":"t7",
            "premium_rate_uid":"r1",
            "premium_rate":"3.5"
        }"#;
        let detail: PolicyDetail = serde_json::from_str(raw).expect("detail");
        assert_eq!(detail.summary.policy_number, PolicyNumber::new("POL-9"));
        assert_eq!(detail.car_brand_uid, BrandId::new("b1"));
        assert_eq!(detail.premium_rate, Decimal::new(35, 1));
        assert_eq!(detail.summary.car_price, Decimal::new(250_000_000, 0));
    }

    #[test]
    fn grouped_wire_amount_strips_separators() {
        assert_eq!(
            lenient::parse_wire_amount("Rp 1.500.000"),
            Decimal::new(1_500_000, 0)
        );
        assert_eq!(lenient::parse_wire_amount(""), Decimal::ZERO);
    }
}
