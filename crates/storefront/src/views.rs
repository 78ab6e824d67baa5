//! Display data shared by several templates.
//!
//! Prices are formatted here, once, with the configured currency symbol so
//! templates only ever print strings.

use cornershop_core::cart::CartSummary;
use cornershop_core::models::{CartItem, Product};
use cornershop_core::{format_money, percent_off};

use crate::middleware::Shopper;

/// What `base.html` needs on every full page.
#[derive(Debug, Clone, Default)]
pub struct Layout {
    /// First name of the signed-in shopper.
    pub user_name: Option<String>,
}

impl Layout {
    #[must_use]
    pub fn new(shopper: Option<&Shopper>) -> Self {
        Self {
            user_name: shopper.map(|s| s.user.first_name().to_string()),
        }
    }

    #[must_use]
    pub const fn is_signed_in(&self) -> bool {
        self.user_name.is_some()
    }
}

/// Product tile used by the home page, listing, recently viewed and wishlist.
#[derive(Debug, Clone)]
pub struct ProductCardView {
    pub id: String,
    pub name: String,
    pub image: Option<String>,
    pub price: String,
    /// List price, shown struck through when discounted.
    pub list_price: Option<String>,
    pub percent_off: Option<u32>,
    pub in_stock: bool,
    pub rating: Option<String>,
}

impl ProductCardView {
    #[must_use]
    pub fn new(product: &Product, currency: &str) -> Self {
        let discounted = product.is_discounted();
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            image: product.primary_image().map(String::from),
            price: format_money(product.effective_price(), currency),
            list_price: discounted.then(|| format_money(product.price, currency)),
            percent_off: if discounted {
                percent_off(product.price, product.effective_price())
            } else {
                None
            },
            in_stock: product.in_stock(),
            rating: product
                .average_rating
                .filter(|r| *r > 0.0)
                .map(|r| format!("{r:.1}")),
        }
    }

    /// Cards for a list of products.
    #[must_use]
    pub fn list(products: &[Product], currency: &str) -> Vec<Self> {
        products.iter().map(|p| Self::new(p, currency)).collect()
    }
}

/// One grouped cart line.
#[derive(Debug, Clone)]
pub struct CartLineView {
    pub product_id: String,
    pub name: String,
    pub image: Option<String>,
    pub quantity: u32,
    pub price: String,
    pub line_price: String,
}

impl CartLineView {
    fn new(item: &CartItem, currency: &str) -> Self {
        Self {
            product_id: item.product_id.to_string(),
            name: item.name.clone(),
            image: item.image.clone(),
            quantity: item.quantity,
            price: format_money(item.price, currency),
            line_price: format_money(
                item.price * rust_decimal::Decimal::from(item.quantity),
                currency,
            ),
        }
    }
}

/// Cart display data for templates.
#[derive(Debug, Clone)]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub item_count: u32,
    pub total: String,
}

impl CartView {
    #[must_use]
    pub fn new(summary: &CartSummary, currency: &str) -> Self {
        Self {
            lines: summary
                .lines
                .iter()
                .map(|item| CartLineView::new(item, currency))
                .collect(),
            item_count: summary.item_count,
            total: format_money(summary.total, currency),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_product_card_discount() {
        let product: Product = serde_json::from_value(json!({
            "_id": "p1",
            "name": "Kettle",
            "price": 40,
            "discountPrice": 30,
            "stock": 0,
            "averageRating": 4.26
        }))
        .unwrap();

        let card = ProductCardView::new(&product, "$");
        assert_eq!(card.price, "$30.00");
        assert_eq!(card.list_price.as_deref(), Some("$40.00"));
        assert_eq!(card.percent_off, Some(25));
        assert!(!card.in_stock);
        assert_eq!(card.rating.as_deref(), Some("4.3"));
    }

    #[test]
    fn test_cart_view_groups_lines() {
        let items: Vec<CartItem> = serde_json::from_value(json!([
            {"productId": "p1", "name": "Kettle", "price": 30, "quantity": 1},
            {"productId": "p1", "name": "Kettle", "price": 30, "quantity": 1},
            {"productId": "p2", "name": "Mug", "price": 1250.5, "quantity": 1}
        ]))
        .unwrap();

        let view = CartView::new(&CartSummary::from_items(&items), "$");
        assert_eq!(view.lines.len(), 2);
        assert_eq!(view.lines[0].quantity, 2);
        assert_eq!(view.lines[0].line_price, "$60.00");
        assert_eq!(view.item_count, 3);
        assert_eq!(view.total, "$1,310.50");
    }
}
