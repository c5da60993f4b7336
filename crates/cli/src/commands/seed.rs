//! Seed the local catalog from a YAML file.
//!
//! The file is parsed and validated with the same rules as the admin API
//! before anything touches the database. Seeding is idempotent: categories
//! and subcategories are matched by name, products by code.
//!
//! ```yaml
//! categories:
//!   - name: Smartphones
//!     subcategories:
//!       - name: Android
//!         products:
//!           - code: SM-S24-256
//!             name: Galaxy S24 256GB
//!             price: 79990
//!             stock: 10
//! ```

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use tracing::{error, info};
use validator::Validate;

use ampere_core::{CategoryId, SubcategoryId};
use ampere_storefront::db::{CategoryRepository, ProductRepository, SubcategoryRepository};
use ampere_storefront::models::{CategoryInput, ProductInput, SubcategoryInput};

use super::connect;

/// Root of the seed file.
#[derive(Debug, Deserialize)]
pub struct SeedCatalog {
    pub categories: Vec<SeedCategory>,
}

#[derive(Debug, Deserialize)]
pub struct SeedCategory {
    pub name: String,
    pub description: Option<String>,
    pub image: Option<String>,
    #[serde(default)]
    pub subcategories: Vec<SeedSubcategory>,
}

#[derive(Debug, Deserialize)]
pub struct SeedSubcategory {
    pub name: String,
    pub description: Option<String>,
    pub image: Option<String>,
    #[serde(default)]
    pub products: Vec<SeedProduct>,
}

#[derive(Debug, Deserialize)]
pub struct SeedProduct {
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    #[serde(with = "ampere_storefront::models::decimal")]
    pub price: Decimal,
    #[serde(default, with = "ampere_storefront::models::decimal::option")]
    pub discounted_price: Option<Decimal>,
    #[serde(default)]
    pub stock: i32,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub specifications: BTreeMap<String, String>,
}

impl SeedCategory {
    fn input(&self) -> CategoryInput {
        CategoryInput {
            name: self.name.clone(),
            description: self.description.clone(),
            image: self.image.clone(),
        }
    }
}

impl SeedSubcategory {
    fn input(&self, category_id: CategoryId) -> SubcategoryInput {
        SubcategoryInput {
            category_id,
            name: self.name.clone(),
            description: self.description.clone(),
            image: self.image.clone(),
        }
    }
}

impl SeedProduct {
    fn input(&self, subcategory_id: SubcategoryId) -> ProductInput {
        ProductInput {
            code: self.code.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            price: self.price,
            discounted_price: self.discounted_price,
            stock: self.stock,
            images: self.images.clone(),
            subcategory_id,
            specifications: self.specifications.clone(),
        }
    }
}

/// Totals written by a seeding run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedResult {
    pub categories: usize,
    pub subcategories: usize,
    pub products_created: usize,
    pub products_updated: usize,
}

/// Check every entry against the admin API rules, plus unique product codes.
///
/// Returns one message per problem; empty means the file is good.
#[must_use]
pub fn validate_catalog(catalog: &SeedCatalog) -> Vec<String> {
    // Ids are only placeholders here; validation doesn't look at them.
    let placeholder_category = CategoryId::new(0);
    let placeholder_subcategory = SubcategoryId::new(0);

    let mut errors = Vec::new();
    let mut codes = HashSet::new();

    for category in &catalog.categories {
        if let Err(e) = category.input().validate() {
            errors.push(format!("category {:?}: {e}", category.name));
        }
        for subcategory in &category.subcategories {
            if let Err(e) = subcategory.input(placeholder_category).validate() {
                errors.push(format!("subcategory {:?}: {e}", subcategory.name));
            }
            for product in &subcategory.products {
                if let Err(e) = product.input(placeholder_subcategory).validate() {
                    errors.push(format!("product {:?}: {e}", product.code));
                }
                if !codes.insert(product.code.as_str()) {
                    errors.push(format!("product {:?}: duplicate code", product.code));
                }
            }
        }
    }

    errors
}

/// Seed the catalog from a YAML file.
///
/// # Errors
///
/// Returns an error if the file can't be read or parsed, fails validation,
/// or a database operation fails.
pub async fn catalog(file_path: &str, clear_existing: bool) -> Result<(), Box<dyn std::error::Error>> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading catalog from file");

    // Read and validate YAML before connecting to database
    let content = tokio::fs::read_to_string(path).await?;
    let catalog: SeedCatalog = serde_yaml::from_str(&content)?;

    let errors = validate_catalog(&catalog);
    if !errors.is_empty() {
        error!("Catalog validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(format!("{} validation errors found", errors.len()).into());
    }

    info!(categories = catalog.categories.len(), "Catalog validated successfully");

    let pool = connect().await?;

    if clear_existing {
        clear_catalog(&pool).await?;
    }

    let result = seed(&pool, &catalog).await?;

    info!(
        categories = result.categories,
        subcategories = result.subcategories,
        products_created = result.products_created,
        products_updated = result.products_updated,
        "Seeding complete!"
    );

    Ok(())
}

async fn clear_catalog(pool: &PgPool) -> Result<(), Box<dyn std::error::Error>> {
    let categories = CategoryRepository::new(pool);
    for existing in categories.list_with_subcategories().await? {
        let removed = categories.delete_cascade(existing.category.id).await?;
        info!(
            category = %existing.category.name,
            subcategories = removed.subcategories,
            products = removed.products,
            "Removed category"
        );
    }
    Ok(())
}

async fn seed(pool: &PgPool, catalog: &SeedCatalog) -> Result<SeedResult, Box<dyn std::error::Error>> {
    let categories = CategoryRepository::new(pool);
    let subcategories = SubcategoryRepository::new(pool);
    let products = ProductRepository::new(pool);

    let existing = categories.list_with_subcategories().await?;
    let mut result = SeedResult::default();

    for seed_category in &catalog.categories {
        let found = existing
            .iter()
            .find(|c| c.category.name.eq_ignore_ascii_case(&seed_category.name));
        let (category_id, known_subcategories) = match found {
            Some(tree) => (tree.category.id, tree.subcategories.clone()),
            None => (categories.create(&seed_category.input()).await?.id, Vec::new()),
        };
        result.categories += 1;

        for seed_subcategory in &seed_category.subcategories {
            let subcategory_id = match known_subcategories
                .iter()
                .find(|s| s.name.eq_ignore_ascii_case(&seed_subcategory.name))
            {
                Some(subcategory) => subcategory.id,
                None => {
                    subcategories
                        .create(&seed_subcategory.input(category_id))
                        .await?
                        .id
                }
            };
            result.subcategories += 1;

            for seed_product in &seed_subcategory.products {
                let input = seed_product.input(subcategory_id);
                match products.get_by_code(&input.code).await? {
                    Some(product) => {
                        products.update(product.id, &input).await?;
                        result.products_updated += 1;
                    }
                    None => {
                        products.create(&input).await?;
                        result.products_created += 1;
                    }
                }
            }
        }
    }

    Ok(result)
}
