//! Lenient decimal (de)serialization.
//!
//! Accepts both JSON numbers and numeric strings, and always serializes as a
//! string so no precision is lost on the way out.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDecimal {
    Text(String),
    Number(serde_json::Number),
}

impl RawDecimal {
    fn parse<E: serde::de::Error>(self) -> Result<Decimal, E> {
        let text = match self {
            Self::Text(text) => text,
            Self::Number(number) => number.to_string(),
        };
        let trimmed = text.trim();
        Decimal::from_str(trimmed)
            .or_else(|_| Decimal::from_scientific(trimmed))
            .map_err(|e| E::custom(format!("invalid decimal {trimmed:?}: {e}")))
    }
}

/// Serialize a decimal as a string.
///
/// # Errors
///
/// Returns the serializer's error.
pub fn serialize<S: Serializer>(value: &Decimal, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

/// Deserialize a decimal from a number or a string.
///
/// # Errors
///
/// Returns an error if the value is neither or does not parse.
pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Decimal, D::Error> {
    RawDecimal::deserialize(deserializer)?.parse()
}

pub mod option {
    use super::{Decimal, Deserialize, Deserializer, RawDecimal, Serializer};

    /// Serialize an optional decimal as a string or null.
    ///
    /// # Errors
    ///
    /// Returns the serializer's error.
    pub fn serialize<S: Serializer>(
        value: &Option<Decimal>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(value) => serializer.collect_str(value),
            None => serializer.serialize_none(),
        }
    }

    /// Deserialize an optional decimal; `null` and a missing field are `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if a present value does not parse.
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Decimal>, D::Error> {
        Option::<RawDecimal>::deserialize(deserializer)?
            .map(RawDecimal::parse)
            .transpose()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde::Serialize;

    use super::*;

    #[derive(Serialize, Deserialize)]
    struct Priced {
        #[serde(with = "super")]
        price: Decimal,
        #[serde(default, with = "super::option")]
        old_price: Option<Decimal>,
    }

    #[test]
    fn test_accepts_numbers_and_strings() {
        let a: Priced = serde_json::from_str(r#"{"price": 1499.9}"#).unwrap();
        assert_eq!(a.price, Decimal::from_str("1499.9").unwrap());
        assert_eq!(a.old_price, None);

        let b: Priced = serde_json::from_str(r#"{"price": "1499.90", "old_price": 1999}"#).unwrap();
        assert_eq!(b.price, Decimal::from_str("1499.90").unwrap());
        assert_eq!(b.old_price, Some(Decimal::from(1999)));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(serde_json::from_str::<Priced>(r#"{"price": "cheap"}"#).is_err());
        assert!(serde_json::from_str::<Priced>(r#"{"price": true}"#).is_err());
    }

    #[test]
    fn test_serializes_as_string() {
        let value = Priced {
            price: Decimal::from(10),
            old_price: None,
        };
        let json = serde_json::to_value(&value).unwrap();
        assert_eq!(json["price"], "10");
        assert!(json["old_price"].is_null());
    }
}
