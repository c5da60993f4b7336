//! Locally managed catalog: categories, subcategories and products.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use ampere_core::{CategoryId, ProductId, SubcategoryId, discount_percent};

/// Top-level catalog section.
#[derive(Debug, Clone, Serialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Second-level catalog section, always inside one category.
#[derive(Debug, Clone, Serialize)]
pub struct Subcategory {
    pub id: SubcategoryId,
    pub category_id: CategoryId,
    pub name: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A category together with its subcategories, for navigation menus.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryWithSubcategories {
    #[serde(flatten)]
    pub category: Category,
    pub subcategories: Vec<Subcategory>,
}

/// A sellable product.
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub id: ProductId,
    /// Unique article code.
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    /// Regular price.
    pub price: Decimal,
    /// Sale price, never above `price`.
    pub discounted_price: Option<Decimal>,
    pub stock: i32,
    pub images: Vec<String>,
    pub subcategory_id: SubcategoryId,
    /// Free-form characteristics, e.g. `"Screen" => "6.1\""`.
    pub specifications: BTreeMap<String, String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Price a customer pays for one unit.
    #[must_use]
    pub fn effective_price(&self) -> Decimal {
        self.discounted_price.unwrap_or(self.price)
    }

    /// Whole-percent discount, if the product is on sale.
    #[must_use]
    pub fn discount_percent(&self) -> Option<u8> {
        self.discounted_price
            .and_then(|reduced| discount_percent(self.price, reduced))
    }

    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

/// Rows removed by a cascading delete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CascadeSummary {
    pub categories: u64,
    pub subcategories: u64,
    pub products: u64,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product(price: i64, discounted: Option<i64>) -> Product {
        Product {
            id: ProductId::new(1),
            code: "SM-A55".to_string(),
            name: "Galaxy A55".to_string(),
            description: None,
            price: Decimal::from(price),
            discounted_price: discounted.map(Decimal::from),
            stock: 0,
            images: vec![],
            subcategory_id: SubcategoryId::new(1),
            specifications: BTreeMap::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_effective_price_prefers_discount() {
        assert_eq!(product(1000, Some(800)).effective_price(), Decimal::from(800));
        assert_eq!(product(1000, None).effective_price(), Decimal::from(1000));
    }

    #[test]
    fn test_discount_percent() {
        assert_eq!(product(1000, Some(800)).discount_percent(), Some(20));
        assert_eq!(product(1000, None).discount_percent(), None);
        assert!(!product(1000, None).in_stock());
    }

    #[test]
    fn test_category_with_subcategories_flattens() {
        let now = Utc::now();
        let tree = CategoryWithSubcategories {
            category: Category {
                id: CategoryId::new(4),
                name: "Phones".to_string(),
                description: None,
                image: None,
                created_at: now,
                updated_at: now,
            },
            subcategories: vec![],
        };
        let json = serde_json::to_value(&tree).unwrap();
        assert_eq!(json["id"], 4);
        assert_eq!(json["name"], "Phones");
        assert!(json["subcategories"].as_array().unwrap().is_empty());
    }
}
