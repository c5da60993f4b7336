//! Ampere Core - Shared domain types.
//!
//! This crate provides the types used across the Ampere Electronics workspace:
//! - `storefront` - Public catalog, cart, checkout and the admin JSON API
//! - `cli` - Migrations, catalog seeding and user management
//!
//! # Architecture
//!
//! The core crate contains only types and pure state transitions - no I/O, no
//! database access, no HTTP clients. Database encoding is available behind the
//! `postgres` feature.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, emails, money and status enums
//! - [`cart`] - Cart line bookkeeping
//! - [`favorites`] - Favorites state and optimistic-sync reconciliation

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod favorites;
pub mod types;

pub use cart::{Cart, CartItem};
pub use favorites::{FavoriteChange, FavoritesState, SyncOutcome, reconcile};
pub use types::*;
