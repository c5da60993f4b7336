//! Built-in product dataset.
//!
//! Served when the upstream API is unreachable and nothing is cached, and
//! when no upstream is configured at all. Stored in the upstream wire format
//! so it goes through the same normalization as live data.

use std::sync::LazyLock;

use ampere_core::Currency;

use super::types::{CatalogProduct, UpstreamProduct};

const MOCK_PRODUCTS_JSON: &str = include_str!("../../data/mock_products.json");

static MOCK_PRODUCTS: LazyLock<Vec<UpstreamProduct>> = LazyLock::new(|| {
    serde_json::from_str(MOCK_PRODUCTS_JSON).unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to parse built-in mock products");
        Vec::new()
    })
});

/// All mock products.
#[must_use]
pub fn mock_products(default_currency: Currency) -> Vec<CatalogProduct> {
    MOCK_PRODUCTS
        .iter()
        .cloned()
        .map(|p| p.normalize(default_currency))
        .collect()
}

/// Mock products of one nomenclature.
#[must_use]
pub fn mock_products_for(nomenclature_id: &str, default_currency: Currency) -> Vec<CatalogProduct> {
    mock_products(default_currency)
        .into_iter()
        .filter(|p| p.nomenclature_id.as_deref() == Some(nomenclature_id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_dataset_parses() {
        let products = mock_products(Currency::Rub);
        assert_eq!(products.len(), 10);
        assert!(products.iter().all(|p| p.price.is_some()));
        assert!(products.iter().all(|p| !p.images.is_empty()));
    }

    #[test]
    fn test_mock_ids_and_codes_unique() {
        let products = mock_products(Currency::Rub);
        let mut codes: Vec<_> = products.iter().map(|p| p.code.as_str()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), products.len());
    }

    #[test]
    fn test_mock_products_for_nomenclature() {
        let phones = mock_products_for("smartphones", Currency::Rub);
        assert_eq!(phones.len(), 3);
        assert!(mock_products_for("drones", Currency::Rub).is_empty());
    }
}
