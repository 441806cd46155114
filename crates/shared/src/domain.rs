use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::protocol::lenient;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn is_empty(&self) -> bool {
                self.0.trim().is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

id_newtype!(PolicyNumber);
id_newtype!(BrandId);
id_newtype!(CarTypeId);
id_newtype!(RateId);
id_newtype!(ActorId);

/// Separator the service uses when it flattens brand and type into `car_name`.
pub const CAR_NAME_SEPARATOR: &str = " - ";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarBrand {
    pub uid: BrandId,
    #[serde(alias = "car_brand_name")]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarType {
    pub uid: CarTypeId,
    #[serde(alias = "car_type_name")]
    pub name: String,
    #[serde(default, alias = "car_brand_uid", alias = "brand")]
    pub brand_uid: BrandId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PremiumRate {
    pub uid: RateId,
    #[serde(with = "lenient::amount")]
    pub rate: Decimal,
}

/// Splits a composite `"Brand - Type"` vehicle name into its display parts.
///
/// A name without the separator is treated as a bare brand.
pub fn split_car_name(car_name: &str) -> (String, String) {
    let mut parts = car_name.splitn(2, CAR_NAME_SEPARATOR);
    let brand = parts.next().unwrap_or_default().trim().to_string();
    let car_type = parts.next().unwrap_or_default().trim().to_string();
    (brand, car_type)
}

pub fn join_car_name(brand: &str, car_type: &str) -> String {
    format!("{brand}{CAR_NAME_SEPARATOR}{car_type}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_composite_car_name() {
        assert_eq!(
            split_car_name("Toyota - Avanza"),
            ("Toyota".to_string(), "Avanza".to_string())
        );
    }

    #[test]
    fn car_name_without_separator_is_brand_only() {
        assert_eq!(
            split_car_name("Toyota"),
            ("Toyota".to_string(), String::new())
        );
    }

    #[test]
    fn rate_accepts_string_or_number() {
        let from_str: PremiumRate =
            serde_json::from_str(r#"{"uid":"r1","rate":"3.5"}"#).expect("string rate");
        let from_num: PremiumRate =
            serde_json::from_str(r#"{"uid":"r1","rate":3.5}"#).expect("numeric rate");
        assert_eq!(from_str, from_num);
        assert_eq!(from_str.rate, Decimal::new(35, 1));
    }

    #[test]
    fn brand_reads_legacy_name_field() {
        let brand: CarBrand =
            serde_json::from_str(r#"{"uid":"b1","car_brand_name":"Honda"}"#).expect("brand");
        assert_eq!(brand.name, "Honda");
        assert_eq!(brand.uid, BrandId::new("b1"));
    }
}
