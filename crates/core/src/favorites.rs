//! Favorites state and optimistic sync reconciliation.
//!
//! Clients update their favorites locally first and then tell the server.
//! [`reconcile`] decides what the local state should be once the server has
//! answered.

use serde::{Deserialize, Serialize};

use crate::types::ProductId;

/// Ordered set of favorited products, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FavoritesState(Vec<ProductId>);

/// A single local edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "product_id", rename_all = "lowercase")]
pub enum FavoriteChange {
    Add(ProductId),
    Remove(ProductId),
}

/// How the server answered a sync request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The server stored the change.
    Accepted,
    /// The visitor is not signed in; favorites stay local only.
    Unauthorized,
    /// Any other failure.
    Failed,
}

impl FavoritesState {
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    #[must_use]
    pub fn contains(&self, product_id: ProductId) -> bool {
        self.0.contains(&product_id)
    }

    #[must_use]
    pub fn product_ids(&self) -> &[ProductId] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Apply a change, returning the new state. Adding a present id or
    /// removing an absent one leaves the state unchanged.
    #[must_use]
    pub fn apply(&self, change: FavoriteChange) -> Self {
        let mut next = self.clone();
        match change {
            FavoriteChange::Add(id) => {
                if !next.contains(id) {
                    next.0.push(id);
                }
            }
            FavoriteChange::Remove(id) => next.0.retain(|existing| *existing != id),
        }
        next
    }
}

impl FromIterator<ProductId> for FavoritesState {
    fn from_iter<I: IntoIterator<Item = ProductId>>(iter: I) -> Self {
        let mut ids = Vec::new();
        for id in iter {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        Self(ids)
    }
}

/// Resolve the local state after a sync attempt for `change`.
///
/// The optimistic state (`previous` with `change` applied) is kept when the
/// server accepted it or when the visitor is anonymous. Any other failure
/// rolls back to `previous`.
#[must_use]
pub fn reconcile(
    previous: &FavoritesState,
    change: FavoriteChange,
    outcome: SyncOutcome,
) -> FavoritesState {
    match outcome {
        SyncOutcome::Accepted | SyncOutcome::Unauthorized => previous.apply(change),
        SyncOutcome::Failed => previous.clone(),
    }
}
