//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use ampere_core::{AuthProvider, Email, UserId, UserRole};

/// A storefront account (domain type).
#[derive(Debug, Clone, Serialize)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// User's email address.
    pub email: Email,
    /// Display name, if known.
    pub name: Option<String>,
    /// Authorization role.
    pub role: UserRole,
    /// How the account signs in.
    pub provider: AuthProvider,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}
