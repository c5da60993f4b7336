//! Domain models for the storefront.
//!
//! These types are validated domain objects, separate from database row types.

pub mod catalog;
pub mod decimal;
pub mod order;
pub mod requests;
pub mod session;
pub mod user;

pub use catalog::{CascadeSummary, Category, CategoryWithSubcategories, Product, Subcategory};
pub use order::{CustomerInfo, Order, OrderItem, OrderStats};
pub use requests::{CategoryInput, ProductInput, SubcategoryInput};
pub use session::{CurrentUser, keys as session_keys};
pub use user::User;
