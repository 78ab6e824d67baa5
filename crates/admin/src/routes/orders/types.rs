//! Type definitions and conversions for order views.

use cornershop_core::models::{Order, OrderItem, ShippingEvent, ShippingInfo};
use cornershop_core::{ShippingStatus, format_money};
use serde::Deserialize;

/// Date format used across order pages.
const DATE_FORMAT: &str = "%b %-d, %Y";
const DATETIME_FORMAT: &str = "%b %-d, %Y %H:%M";

// =============================================================================
// Query Parameters
// =============================================================================

/// Page number of the orders table. Anything unparsable means page 1.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

impl PageQuery {
    #[must_use]
    pub fn number(&self) -> u32 {
        self.page
            .as_deref()
            .and_then(|p| p.trim().parse().ok())
            .unwrap_or(1)
    }
}

// =============================================================================
// Views
// =============================================================================

/// Order row for the list table and the dashboard.
#[derive(Debug, Clone)]
pub struct OrderRowView {
    pub id: String,
    pub short_id: String,
    pub created_at: String,
    pub customer_name: String,
    pub customer_email: String,
    pub item_count: u32,
    pub total: String,
    pub payment_status: &'static str,
    pub payment_class: &'static str,
    pub shipping_status: &'static str,
    pub shipping_class: &'static str,
}

impl OrderRowView {
    #[must_use]
    pub fn new(order: &Order, currency: &str) -> Self {
        Self {
            id: order.id.to_string(),
            short_id: order.short_id(),
            created_at: order
                .created_at
                .map(|at| at.format(DATE_FORMAT).to_string())
                .unwrap_or_default(),
            customer_name: order.customer_name().to_string(),
            customer_email: order
                .user
                .as_ref()
                .map(|u| u.email.clone())
                .unwrap_or_default(),
            item_count: order.item_count(),
            total: format_money(order.total, currency),
            payment_status: order.payment_status.label(),
            payment_class: order.payment_status.badge_class(),
            shipping_status: order.shipping_status.label(),
            shipping_class: order.shipping_status.badge_class(),
        }
    }
}

/// Order line for detail and print pages.
#[derive(Debug, Clone)]
pub struct LineItemView {
    pub name: String,
    pub quantity: u32,
    pub price: String,
    pub total: String,
}

impl LineItemView {
    fn new(item: &OrderItem, currency: &str) -> Self {
        Self {
            name: item.name.clone(),
            quantity: item.quantity,
            price: format_money(item.price, currency),
            total: format_money(item.line_total(), currency),
        }
    }
}

/// Full order for the detail and print pages.
#[derive(Debug, Clone)]
pub struct OrderDetailView {
    pub row: OrderRowView,
    pub items: Vec<LineItemView>,
    pub address_lines: Vec<String>,
    pub payment_method: &'static str,
    pub subtotal: String,
    pub discount: Option<String>,
    pub shipping_fee: String,
    pub coupon_code: Option<String>,
}

impl OrderDetailView {
    #[must_use]
    pub fn new(order: &Order, currency: &str) -> Self {
        Self {
            row: OrderRowView::new(order, currency),
            items: order
                .items
                .iter()
                .map(|i| LineItemView::new(i, currency))
                .collect(),
            address_lines: order.shipping_address.lines(),
            payment_method: order.payment_method.label(),
            subtotal: format_money(order.subtotal, currency),
            discount: (!order.discount.is_zero())
                .then(|| format!("-{}", format_money(order.discount, currency))),
            shipping_fee: format_money(order.shipping_fee, currency),
            coupon_code: order.coupon_code.clone(),
        }
    }
}

/// One shipping history entry.
#[derive(Debug, Clone)]
pub struct ShippingEventView {
    pub status: &'static str,
    pub status_class: &'static str,
    pub at: String,
    pub note: Option<String>,
}

impl From<&ShippingEvent> for ShippingEventView {
    fn from(event: &ShippingEvent) -> Self {
        Self {
            status: event.status.label(),
            status_class: event.status.badge_class(),
            at: event.at.format(DATETIME_FORMAT).to_string(),
            note: event.note.clone(),
        }
    }
}

/// Current shipping record summary.
#[derive(Debug, Clone)]
pub struct ShippingView {
    pub carrier: Option<String>,
    pub tracking_number: Option<String>,
    pub estimated_delivery: Option<String>,
    /// Newest first.
    pub history: Vec<ShippingEventView>,
}

impl From<&ShippingInfo> for ShippingView {
    fn from(info: &ShippingInfo) -> Self {
        let mut history: Vec<&ShippingEvent> = info.history.iter().collect();
        history.sort_by(|a, b| b.at.cmp(&a.at));
        Self {
            carrier: info.carrier.clone(),
            tracking_number: info.tracking_number.clone(),
            estimated_delivery: info
                .estimated_delivery
                .map(|at| at.format(DATE_FORMAT).to_string()),
            history: history.into_iter().map(ShippingEventView::from).collect(),
        }
    }
}

/// Shipping status choice in the update form.
#[derive(Debug, Clone)]
pub struct StatusOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

/// Every shipping status, with `selected` marked.
#[must_use]
pub fn status_options(selected: &str) -> Vec<StatusOption> {
    let current = selected.parse::<ShippingStatus>().ok();
    ShippingStatus::ALL
        .iter()
        .map(|s| StatusOption {
            value: s.as_str(),
            label: s.label(),
            selected: current == Some(*s),
        })
        .collect()
}

/// One numbered pagination link.
#[derive(Debug, Clone)]
pub struct PageLink {
    pub number: u32,
    pub href: String,
    pub current: bool,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeZone, Utc};
    use cornershop_core::models::{Address, OrderCustomer};
    use cornershop_core::{OrderId, PaymentMethod, PaymentStatus, ProductId, UserId};
    use rust_decimal::dec;

    use super::*;

    fn order() -> Order {
        Order {
            id: OrderId::new("65f0c1d2e3a4b5c6d7e8f901"),
            user: Some(OrderCustomer {
                id: UserId::new("u1"),
                name: "Ada Lovelace".to_string(),
                email: "ada@example.com".to_string(),
            }),
            items: vec![OrderItem {
                product_id: ProductId::new("p1"),
                name: "Green tea".to_string(),
                price: dec!(12.5),
                quantity: 2,
                image: None,
            }],
            shipping_address: Address {
                full_name: "Ada Lovelace".to_string(),
                city: "London".to_string(),
                ..Address::default()
            },
            payment_method: PaymentMethod::Online,
            payment_status: PaymentStatus::Paid,
            shipping_status: ShippingStatus::Shipped,
            subtotal: dec!(25),
            discount: dec!(5),
            shipping_fee: dec!(4.99),
            total: dec!(24.99),
            coupon_code: Some("FIVE".to_string()),
            created_at: Some(Utc.with_ymd_and_hms(2026, 3, 9, 10, 30, 0).unwrap()),
        }
    }

    #[test]
    fn test_row_view() {
        let row = OrderRowView::new(&order(), "$");
        assert_eq!(row.short_id, "D7E8F901");
        assert_eq!(row.created_at, "Mar 9, 2026");
        assert_eq!(row.customer_email, "ada@example.com");
        assert_eq!(row.item_count, 2);
        assert_eq!(row.total, "$24.99");
        assert_eq!(row.payment_class, "badge badge-success");
    }

    #[test]
    fn test_detail_view() {
        let detail = OrderDetailView::new(&order(), "$");
        assert_eq!(detail.items.first().unwrap().total, "$25.00");
        assert_eq!(detail.discount.as_deref(), Some("-$5.00"));
        assert_eq!(detail.address_lines, vec!["Ada Lovelace", "London"]);
    }

    #[test]
    fn test_page_query_is_lenient() {
        assert_eq!(PageQuery { page: Some("3".into()) }.number(), 3);
        assert_eq!(PageQuery { page: Some("x".into()) }.number(), 1);
        assert_eq!(PageQuery::default().number(), 1);
    }

    #[test]
    fn test_status_options_mark_current() {
        let options = status_options("out_for_delivery");
        let selected: Vec<_> = options.iter().filter(|o| o.selected).map(|o| o.value).collect();
        assert_eq!(selected, vec!["out_for_delivery"]);
    }
}
