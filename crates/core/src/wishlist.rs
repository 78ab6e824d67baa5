//! Wishlist membership.

use crate::models::Wishlist;
use crate::types::ProductId;

impl Wishlist {
    /// Whether the product is on the list. Drives the heart button.
    #[must_use]
    pub fn contains(&self, product_id: &ProductId) -> bool {
        self.products.iter().any(|p| &p.id == product_id)
    }

    pub fn product_ids(&self) -> impl Iterator<Item = &ProductId> {
        self.products.iter().map(|p| &p.id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// What a toggle click should do for this product.
    #[must_use]
    pub fn toggle_action(&self, product_id: &ProductId) -> Toggle {
        if self.contains(product_id) {
            Toggle::Remove
        } else {
            Toggle::Add
        }
    }
}

/// Direction of a wishlist toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Add,
    Remove,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn wishlist() -> Wishlist {
        serde_json::from_value(json!({
            "userId": "u1",
            "products": [
                { "_id": "p1", "name": "Kettle", "price": 30 },
                { "_id": "p2", "name": "Teapot", "price": 25 }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_contains() {
        let list = wishlist();
        assert!(list.contains(&ProductId::new("p1")));
        assert!(!list.contains(&ProductId::new("p3")));
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_product_ids_in_order() {
        let list = wishlist();
        let ids: Vec<&str> = list.product_ids().map(ProductId::as_str).collect();
        assert_eq!(ids, vec!["p1", "p2"]);
    }

    #[test]
    fn test_toggle_action() {
        let list = wishlist();
        assert_eq!(list.toggle_action(&ProductId::new("p2")), Toggle::Remove);
        assert_eq!(list.toggle_action(&ProductId::new("p9")), Toggle::Add);
        assert_eq!(Wishlist::default().toggle_action(&ProductId::new("p1")), Toggle::Add);
    }
}
