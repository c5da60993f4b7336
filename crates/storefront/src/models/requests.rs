//! Validated write payloads for the catalog.
//!
//! Used by the admin API, repositories and the CLI seeder, so the same rules
//! apply no matter how data enters the database.

use std::borrow::Cow;
use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use validator::{Validate, ValidationError};

use ampere_core::{CategoryId, SubcategoryId};

/// Maximum length of a product code.
pub const MAX_CODE_LENGTH: usize = 64;

/// Maximum number of images per product.
pub const MAX_PRODUCT_IMAGES: usize = 20;

/// Create or replace a category.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CategoryInput {
    #[validate(length(min = 2, max = 100, message = "Name must be 2-100 characters"))]
    pub name: String,

    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,

    #[validate(url(message = "Image must be a valid URL"))]
    pub image: Option<String>,
}

/// Create or replace a subcategory.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SubcategoryInput {
    pub category_id: CategoryId,

    #[validate(length(min = 2, max = 100, message = "Name must be 2-100 characters"))]
    pub name: String,

    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,

    #[validate(url(message = "Image must be a valid URL"))]
    pub image: Option<String>,
}

/// Create or replace a product.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_discount_within_price", skip_on_field_errors = false))]
pub struct ProductInput {
    #[validate(custom(function = "validate_code"))]
    #[serde(deserialize_with = "trimmed")]
    pub code: String,

    #[validate(length(min = 2, max = 200, message = "Name must be 2-200 characters"))]
    pub name: String,

    pub description: Option<String>,

    #[validate(custom(function = "validate_non_negative"))]
    #[serde(with = "super::decimal")]
    pub price: Decimal,

    #[validate(custom(function = "validate_non_negative"))]
    #[serde(default, with = "super::decimal::option")]
    pub discounted_price: Option<Decimal>,

    #[validate(range(min = 0, message = "Stock cannot be negative"))]
    #[serde(default)]
    pub stock: i32,

    #[validate(custom(function = "validate_image_urls"))]
    #[serde(default)]
    pub images: Vec<String>,

    pub subcategory_id: SubcategoryId,

    #[serde(default)]
    pub specifications: BTreeMap<String, String>,
}

fn trimmed<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    String::deserialize(deserializer).map(|s| s.trim().to_owned())
}

/// Checks the trimmed code, which is what gets stored.
fn validate_code(code: &str) -> Result<(), ValidationError> {
    let length = code.trim().chars().count();
    if length == 0 || length > MAX_CODE_LENGTH {
        return Err(ValidationError::new("length")
            .with_message(Cow::Borrowed("Code must be 1-64 characters")));
    }
    Ok(())
}

fn validate_non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if *value < Decimal::ZERO {
        return Err(ValidationError::new("range")
            .with_message(Cow::Borrowed("Price cannot be negative")));
    }
    Ok(())
}

fn validate_image_urls(images: &[String]) -> Result<(), ValidationError> {
    if images.len() > MAX_PRODUCT_IMAGES {
        return Err(ValidationError::new("length")
            .with_message(Cow::Borrowed("At most 20 images are allowed")));
    }
    if images.iter().any(|image| url::Url::parse(image).is_err()) {
        return Err(ValidationError::new("url")
            .with_message(Cow::Borrowed("Every image must be a valid URL")));
    }
    Ok(())
}

fn validate_discount_within_price(input: &ProductInput) -> Result<(), ValidationError> {
    match input.discounted_price {
        Some(discounted) if discounted > input.price => Err(ValidationError::new(
            "discounted_price",
        )
        .with_message(Cow::Borrowed(
            "Discounted price cannot exceed the regular price",
        ))),
        _ => Ok(()),
    }
}
