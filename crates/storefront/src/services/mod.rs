//! Business logic that sits between route handlers and repositories.
//!
//! - [`auth`] - Password registration and login, OAuth account linking
//! - [`oauth`] - Authorization-code flow against the configured provider
//! - [`checkout`] - Pricing a cart into order lines, order numbers

pub mod auth;
pub mod checkout;
pub mod oauth;
