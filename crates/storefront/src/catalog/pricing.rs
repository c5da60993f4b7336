//! Applying price lists to catalog products.

use std::collections::HashMap;

use ampere_core::Currency;

use super::types::{CatalogProduct, PriceEntry, parse_currency};

/// Price type preferred over any other entry for the same product.
pub const PREFERRED_PRICE_TYPE: &str = "Online";

/// Apply price-list entries to products.
///
/// For each product the `Online` entry wins, otherwise the first entry listed
/// for it. Products without any entry keep their own prices. Runs in one pass
/// over each input.
#[must_use]
pub fn merge_prices(
    products: Vec<CatalogProduct>,
    entries: Vec<PriceEntry>,
    default_currency: Currency,
) -> Vec<CatalogProduct> {
    let mut by_product: HashMap<String, Vec<PriceEntry>> = HashMap::new();
    for entry in entries {
        by_product
            .entry(entry.product_id.clone())
            .or_default()
            .push(entry);
    }

    products
        .into_iter()
        .map(|mut product| {
            let selected = by_product.get(&product.id).and_then(|entries| {
                entries
                    .iter()
                    .find(|e| e.price_type.eq_ignore_ascii_case(PREFERRED_PRICE_TYPE))
                    .or_else(|| entries.first())
            });

            if let Some(entry) = selected {
                product.price = Some(entry.price);
                product.original_price = entry.old_price;
                product.currency = parse_currency(entry.currency.as_deref(), default_currency);
                product.price_type = Some(entry.price_type.clone());
                product.refresh_discount();
            }

            product
        })
        .collect()
}
