//! User role management.
//!
//! The first admin has to be promoted here; after that admins can manage
//! roles through `/api/admin/users`.

use ampere_core::{Email, UserRole};
use ampere_storefront::db::UserRepository;

use super::connect;

/// Set the role of the user with this email.
///
/// # Errors
///
/// Returns an error if the email is invalid, no such user exists, or the
/// database is unreachable.
pub async fn set_role(email: &str, role: UserRole) -> Result<(), Box<dyn std::error::Error>> {
    let email = Email::parse(email)?;
    let pool = connect().await?;

    let user = UserRepository::new(&pool)
        .set_role_by_email(&email, role)
        .await
        .map_err(|e| format!("Could not update {email}: {e}"))?;

    tracing::info!(user_id = %user.id, email = %user.email, role = %user.role, "Role updated");
    Ok(())
}
