//! Shopping cart bookkeeping.
//!
//! A [`Cart`] only tracks which products and how many of each. Prices and
//! availability are resolved against the catalog at read and checkout time.

use serde::{Deserialize, Serialize};

use crate::types::ProductId;

/// Upper bound for the quantity of a single cart line.
pub const MAX_LINE_QUANTITY: u32 = 99;

/// One product in the cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// An ordered list of cart lines, at most one per product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Add `quantity` of a product, merging with an existing line.
    ///
    /// The resulting line quantity is capped at [`MAX_LINE_QUANTITY`]. Adding
    /// zero is a no-op. Returns the line's new quantity.
    pub fn add(&mut self, product_id: ProductId, quantity: u32) -> u32 {
        if let Some(line) = self.line_mut(product_id) {
            line.quantity = line.quantity.saturating_add(quantity).min(MAX_LINE_QUANTITY);
            return line.quantity;
        }

        if quantity == 0 {
            return 0;
        }

        let quantity = quantity.min(MAX_LINE_QUANTITY);
        self.items.push(CartItem {
            product_id,
            quantity,
        });
        quantity
    }

    /// Replace a line's quantity. Zero removes the line.
    ///
    /// Returns `false` if the product is not in the cart.
    pub fn set_quantity(&mut self, product_id: ProductId, quantity: u32) -> bool {
        if quantity == 0 {
            return self.remove(product_id);
        }

        match self.line_mut(product_id) {
            Some(line) => {
                line.quantity = quantity.min(MAX_LINE_QUANTITY);
                true
            }
            None => false,
        }
    }

    /// Remove a line. Returns `false` if it was not present.
    pub fn remove(&mut self, product_id: ProductId) -> bool {
        let before = self.items.len();
        self.items.retain(|line| line.product_id != product_id);
        self.items.len() != before
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Sum of all line quantities.
    #[must_use]
    pub fn total_quantity(&self) -> u32 {
        self.items.iter().map(|line| line.quantity).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Product ids in line order.
    #[must_use]
    pub fn product_ids(&self) -> Vec<ProductId> {
        self.items.iter().map(|line| line.product_id).collect()
    }

    fn line_mut(&mut self, product_id: ProductId) -> Option<&mut CartItem> {
        self.items
            .iter_mut()
            .find(|line| line.product_id == product_id)
    }
}

impl FromIterator<CartItem> for Cart {
    /// Build a cart from raw lines, merging duplicates the same way [`Cart::add`] does.
    fn from_iter<I: IntoIterator<Item = CartItem>>(iter: I) -> Self {
        let mut cart = Self::new();
        for item in iter {
            cart.add(item.product_id, item.quantity);
        }
        cart
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const PHONE: ProductId = ProductId::new(1);
    const CHARGER: ProductId = ProductId::new(2);

    #[test]
    fn test_add_merges_lines() {
        let mut cart = Cart::new();
        assert_eq!(cart.add(PHONE, 1), 1);
        assert_eq!(cart.add(CHARGER, 2), 2);
        assert_eq!(cart.add(PHONE, 2), 3);

        assert_eq!(cart.items().len(), 2);
        assert_eq!(cart.total_quantity(), 5);
        assert_eq!(cart.product_ids(), vec![PHONE, CHARGER]);
    }

    #[test]
    fn test_add_caps_line_quantity() {
        let mut cart = Cart::new();
        cart.add(PHONE, 90);
        assert_eq!(cart.add(PHONE, 20), MAX_LINE_QUANTITY);
        assert_eq!(cart.add(CHARGER, 500), MAX_LINE_QUANTITY);
    }

    #[test]
    fn test_add_zero_does_not_create_line() {
        let mut cart = Cart::new();
        assert_eq!(cart.add(PHONE, 0), 0);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_set_quantity_zero_removes() {
        let mut cart = Cart::new();
        cart.add(PHONE, 3);
        assert!(cart.set_quantity(PHONE, 5));
        assert_eq!(cart.total_quantity(), 5);

        assert!(cart.set_quantity(PHONE, 0));
        assert!(cart.is_empty());
        assert!(!cart.set_quantity(CHARGER, 1));
    }

    #[test]
    fn test_remove_and_clear() {
        let mut cart = Cart::new();
        cart.add(PHONE, 1);
        cart.add(CHARGER, 1);

        assert!(cart.remove(PHONE));
        assert!(!cart.remove(PHONE));
        assert_eq!(cart.product_ids(), vec![CHARGER]);

        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.total_quantity(), 0);
    }

    #[test]
    fn test_from_iter_merges_duplicates() {
        let cart: Cart = [
            CartItem {
                product_id: PHONE,
                quantity: 1,
            },
            CartItem {
                product_id: PHONE,
                quantity: 4,
            },
        ]
        .into_iter()
        .collect();

        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.total_quantity(), 5);
    }

    #[test]
    fn test_serde_round_trip_for_session_storage() {
        let mut cart = Cart::new();
        cart.add(PHONE, 2);
        let json = serde_json::to_value(&cart).unwrap();
        assert_eq!(json["items"][0]["product_id"], 1);
        let back: Cart = serde_json::from_value(json).unwrap();
        assert_eq!(back, cart);
    }
}
