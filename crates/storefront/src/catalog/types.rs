//! Upstream wire formats and the normalized catalog product.
//!
//! The upstream API serves two product shapes. Newer endpoints return the
//! "ultra" shape with nested pricing and characteristics; older ones return a
//! flat legacy record. Both are accepted here and converted once, in
//! [`UpstreamProduct::normalize`], so nothing past this module needs to know
//! about either.

use std::collections::BTreeMap;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use ampere_core::{Currency, discount_percent};

/// A product as served by the upstream API.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum UpstreamProduct {
    Ultra(UltraProduct),
    Legacy(LegacyProduct),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UltraProduct {
    #[serde(deserialize_with = "lenient_id")]
    pub id: String,
    pub article: String,
    pub title: String,
    #[serde(default)]
    pub short_description: Option<String>,
    #[serde(default)]
    pub full_description: Option<String>,
    pub pricing: UltraPricing,
    #[serde(default)]
    pub gallery: Vec<String>,
    #[serde(default)]
    pub nomenclature: Option<NomenclatureRef>,
    #[serde(default)]
    pub characteristics: Vec<Characteristic>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UltraPricing {
    #[serde(default, with = "crate::models::decimal::option")]
    pub current: Option<Decimal>,
    #[serde(default, with = "crate::models::decimal::option")]
    pub previous: Option<Decimal>,
    #[serde(default)]
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NomenclatureRef {
    #[serde(deserialize_with = "lenient_id")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Characteristic {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyProduct {
    #[serde(deserialize_with = "lenient_id")]
    pub id: String,
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, with = "crate::models::decimal::option")]
    pub price: Option<Decimal>,
    #[serde(default, with = "crate::models::decimal::option")]
    pub old_price: Option<Decimal>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default, deserialize_with = "lenient_optional_id")]
    pub nomenclature_id: Option<String>,
}

/// A product in the shape the storefront serves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogProduct {
    pub id: String,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    #[serde(with = "crate::models::decimal::option")]
    pub price: Option<Decimal>,
    /// Price before discount, when the product is on sale.
    #[serde(with = "crate::models::decimal::option")]
    pub original_price: Option<Decimal>,
    pub discount_percent: Option<u8>,
    pub currency: Currency,
    pub images: Vec<String>,
    pub nomenclature_id: Option<String>,
    pub specifications: BTreeMap<String, String>,
    /// Price type of the price-list entry applied, if any.
    pub price_type: Option<String>,
}

impl CatalogProduct {
    /// Recompute `discount_percent` from the current price fields.
    pub fn refresh_discount(&mut self) {
        self.discount_percent = match (self.original_price, self.price) {
            (Some(original), Some(price)) => discount_percent(original, price),
            _ => None,
        };
    }
}

impl UpstreamProduct {
    /// Convert to the storefront shape.
    ///
    /// `default_currency` applies when the record carries no currency or one
    /// the storefront doesn't know.
    #[must_use]
    pub fn normalize(self, default_currency: Currency) -> CatalogProduct {
        let mut product = match self {
            Self::Ultra(p) => CatalogProduct {
                id: p.id,
                code: p.article,
                name: p.title,
                description: p.full_description.or(p.short_description),
                price: p.pricing.current,
                original_price: p.pricing.previous,
                discount_percent: None,
                currency: parse_currency(p.pricing.currency.as_deref(), default_currency),
                images: p.gallery,
                nomenclature_id: p.nomenclature.map(|n| n.id),
                specifications: p
                    .characteristics
                    .into_iter()
                    .map(|c| (c.name, c.value))
                    .collect(),
                price_type: None,
            },
            Self::Legacy(p) => CatalogProduct {
                id: p.id,
                code: p.code,
                name: p.name,
                description: p.description,
                price: p.price,
                original_price: p.old_price,
                discount_percent: None,
                currency: default_currency,
                images: p.image.into_iter().collect(),
                nomenclature_id: p.nomenclature_id,
                specifications: BTreeMap::new(),
                price_type: None,
            },
        };
        product.refresh_discount();
        product
    }
}

/// One entry of a nomenclature's price list.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceEntry {
    #[serde(deserialize_with = "lenient_id")]
    pub product_id: String,
    pub price_type: String,
    #[serde(with = "crate::models::decimal")]
    pub price: Decimal,
    #[serde(default, with = "crate::models::decimal::option")]
    pub old_price: Option<Decimal>,
    #[serde(default)]
    pub currency: Option<String>,
}

/// Upstream list responses come either bare or wrapped in `{"data": [...]}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Envelope<T> {
    Bare(Vec<T>),
    Wrapped { data: Vec<T> },
}

impl<T> Envelope<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::Bare(items) | Self::Wrapped { data: items } => items,
        }
    }
}

pub(crate) fn parse_currency(code: Option<&str>, default: Currency) -> Currency {
    code.and_then(|c| Currency::from_str(c).ok()).unwrap_or(default)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(i64),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Text(text) => text,
            RawId::Number(number) => number.to_string(),
        }
    }
}

/// Upstream IDs arrive as strings or integers depending on the endpoint.
fn lenient_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    RawId::deserialize(deserializer).map(String::from)
}

fn lenient_optional_id<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Option::<RawId>::deserialize(deserializer).map(|id| id.map(String::from))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_ultra_product_normalizes() {
        let raw: UpstreamProduct = serde_json::from_value(json!({
            "id": 501,
            "article": "SMS-S24-256",
            "title": "Samsung Galaxy S24 256GB",
            "shortDescription": "Flagship",
            "pricing": { "current": 74990, "previous": "89990", "currency": "RUR" },
            "gallery": ["https://cdn.example.com/s24-1.jpg", "https://cdn.example.com/s24-2.jpg"],
            "nomenclature": { "id": "smartphones", "name": "Smartphones" },
            "characteristics": [{ "name": "Memory", "value": "256 GB" }]
        }))
        .unwrap();
        assert!(matches!(raw, UpstreamProduct::Ultra(_)));

        let product = raw.normalize(Currency::Usd);
        assert_eq!(product.id, "501");
        assert_eq!(product.code, "SMS-S24-256");
        assert_eq!(product.description.as_deref(), Some("Flagship"));
        assert_eq!(product.price, Some(Decimal::from(74_990)));
        assert_eq!(product.discount_percent, Some(17));
        assert_eq!(product.currency, Currency::Rub);
        assert_eq!(product.images.len(), 2);
        assert_eq!(product.nomenclature_id.as_deref(), Some("smartphones"));
        assert_eq!(product.specifications["Memory"], "256 GB");
    }

    #[test]
    fn test_legacy_product_normalizes() {
        let raw: UpstreamProduct = serde_json::from_value(json!({
            "id": "L-7",
            "code": "LOG-MX3",
            "name": "Logitech MX Master 3S",
            "price": "8990.00",
            "image": "https://cdn.example.com/mx3.jpg",
            "nomenclatureId": 12
        }))
        .unwrap();
        assert!(matches!(raw, UpstreamProduct::Legacy(_)));

        let product = raw.normalize(Currency::Rub);
        assert_eq!(product.name, "Logitech MX Master 3S");
        assert_eq!(product.original_price, None);
        assert_eq!(product.discount_percent, None);
        assert_eq!(product.images, ["https://cdn.example.com/mx3.jpg"]);
        assert_eq!(product.nomenclature_id.as_deref(), Some("12"));
    }

    #[test]
    fn test_envelope_accepts_both_shapes() {
        let bare: Envelope<PriceEntry> = serde_json::from_value(json!([
            { "productId": 1, "priceType": "Online", "price": 10 }
        ]))
        .unwrap();
        assert_eq!(bare.into_vec().len(), 1);

        let wrapped: Envelope<PriceEntry> = serde_json::from_value(json!({
            "data": [
                { "productId": "1", "priceType": "Retail", "price": "12.50" },
                { "productId": "2", "priceType": "Online", "price": 11, "oldPrice": 15 }
            ]
        }))
        .unwrap();
        let entries = wrapped.into_vec();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].old_price, Some(Decimal::from(15)));
    }

    #[test]
    fn test_catalog_product_serializes_prices_as_strings() {
        let raw: UpstreamProduct = serde_json::from_value(json!({
            "id": 1, "code": "X", "name": "Cable", "price": 199.5
        }))
        .unwrap();
        let value = serde_json::to_value(raw.normalize(Currency::Rub)).unwrap();
        assert_eq!(value["price"], "199.5");
        assert_eq!(value["currency"], "RUB");
        assert!(value["original_price"].is_null());
    }
}
