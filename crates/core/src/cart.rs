//! Cart line grouping.
//!
//! The backend appends a line per add-to-cart call, so a cart can hold the
//! same product several times. The frontends always show one line per
//! product with the quantities summed.

use std::collections::HashMap;

use rust_decimal::Decimal;

use crate::models::{Cart, CartItem};
use crate::types::ProductId;

/// Merge lines sharing a `product_id` in a single pass.
///
/// The first occurrence keeps its position, name, price and image. Lines
/// whose summed quantity is zero are dropped.
#[must_use]
pub fn group_items(items: &[CartItem]) -> Vec<CartItem> {
    let mut grouped: Vec<CartItem> = Vec::with_capacity(items.len());
    let mut index: HashMap<&ProductId, usize> = HashMap::with_capacity(items.len());

    for item in items {
        if let Some(&at) = index.get(&item.product_id) {
            if let Some(line) = grouped.get_mut(at) {
                line.quantity = line.quantity.saturating_add(item.quantity);
            }
        } else {
            index.insert(&item.product_id, grouped.len());
            grouped.push(item.clone());
        }
    }

    grouped.retain(|line| line.quantity > 0);
    grouped
}

/// What the cart page, sidebar and badge render.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartSummary {
    pub lines: Vec<CartItem>,
    pub item_count: u32,
    pub total: Decimal,
}

impl CartSummary {
    #[must_use]
    pub fn from_items(items: &[CartItem]) -> Self {
        let lines = group_items(items);
        let item_count = lines
            .iter()
            .fold(0_u32, |count, l| count.saturating_add(l.quantity));
        let total = lines
            .iter()
            .map(|l| l.price * Decimal::from(l.quantity))
            .sum();

        Self {
            lines,
            item_count,
            total,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Quantity of a product after grouping, 0 when absent.
    #[must_use]
    pub fn quantity_of(&self, product_id: &ProductId) -> u32 {
        self.lines
            .iter()
            .find(|l| &l.product_id == product_id)
            .map_or(0, |l| l.quantity)
    }
}

impl From<&Cart> for CartSummary {
    fn from(cart: &Cart) -> Self {
        Self::from_items(&cart.items)
    }
}

/// Result of stepping a grouped line's quantity down by one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decrement {
    /// Set the line to this quantity.
    SetQuantity(u32),
    /// The line was at one (or absent); remove it.
    Remove,
}

/// Decide what a decrement click does for the current quantity.
#[must_use]
pub const fn decrement(current: u32) -> Decrement {
    if current <= 1 {
        Decrement::Remove
    } else {
        Decrement::SetQuantity(current - 1)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::dec;

    use super::*;

    fn line(id: &str, qty: u32, price: Decimal) -> CartItem {
        CartItem {
            product_id: ProductId::new(id),
            name: format!("Product {id}"),
            price,
            quantity: qty,
            image: None,
        }
    }

    #[test]
    fn test_group_items_merges_duplicates() {
        let grouped = group_items(&[line("a", 1, dec!(2)), line("a", 1, dec!(2))]);
        assert_eq!(grouped.len(), 1);
        assert_eq!(grouped[0].quantity, 2);
    }

    #[test]
    fn test_group_items_keeps_first_position_and_fields() {
        let mut renamed = line("a", 3, dec!(9));
        renamed.name = "Later name".to_string();
        let grouped = group_items(&[line("b", 1, dec!(1)), line("a", 1, dec!(2)), renamed]);

        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[0].product_id.as_str(), "b");
        assert_eq!(grouped[1].product_id.as_str(), "a");
        assert_eq!(grouped[1].quantity, 4);
        assert_eq!(grouped[1].name, "Product a");
        assert_eq!(grouped[1].price, dec!(2));
    }

    #[test]
    fn test_group_items_drops_zero_quantity() {
        let grouped = group_items(&[line("a", 0, dec!(2)), line("b", 2, dec!(1))]);
        assert_eq!(grouped.len(), 1);
        assert_eq!(grouped[0].product_id.as_str(), "b");
    }

    #[test]
    fn test_summary_totals() {
        let summary = CartSummary::from_items(&[
            line("a", 2, dec!(3.50)),
            line("b", 1, dec!(10)),
            line("a", 1, dec!(3.50)),
        ]);
        assert_eq!(summary.item_count, 4);
        assert_eq!(summary.total, dec!(20.50));
        assert_eq!(summary.quantity_of(&ProductId::new("a")), 3);
        assert_eq!(summary.quantity_of(&ProductId::new("z")), 0);
    }

    #[test]
    fn test_item_count_saturates() {
        let summary =
            CartSummary::from_items(&[line("a", u32::MAX, dec!(1)), line("b", 5, dec!(1))]);
        assert_eq!(summary.item_count, u32::MAX);
    }

    #[test]
    fn test_empty_summary() {
        let summary = CartSummary::from(&Cart::default());
        assert!(summary.is_empty());
        assert_eq!(summary.item_count, 0);
        assert_eq!(summary.total, Decimal::ZERO);
    }

    #[test]
    fn test_decrement_removes_at_one() {
        assert_eq!(decrement(3), Decrement::SetQuantity(2));
        assert_eq!(decrement(1), Decrement::Remove);
        assert_eq!(decrement(0), Decrement::Remove);
    }
}
