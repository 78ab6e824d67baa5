//! Dashboard route handler.

use askama::Template;
use axum::{extract::State, response::Html};
use chrono::{DateTime, Utc};
use cornershop_core::format_money;
use cornershop_core::models::{Category, Coupon, Offer, Order, Product};
use rust_decimal::Decimal;
use tower_sessions::Session;
use tracing::instrument;

use super::orders::OrderRowView;
use super::{AdminUserView, render, take_flash};
use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireAdmin;
use crate::state::AppState;

/// Orders listed under "Recent orders".
const RECENT_ORDERS: usize = 5;

/// Dashboard metrics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardMetrics {
    pub products: usize,
    pub categories: usize,
    pub orders: usize,
    pub pending_orders: usize,
    pub revenue: String,
    pub live_offers: usize,
    pub usable_coupons: usize,
    /// Products with nothing left in stock.
    pub out_of_stock: usize,
}

/// Dashboard page template.
#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub flash: Option<String>,
    pub metrics: DashboardMetrics,
    pub recent_orders: Vec<OrderRowView>,
}

/// Revenue counts every order that was not cancelled or returned.
fn revenue(orders: &[Order]) -> Decimal {
    orders
        .iter()
        .filter(|o| {
            !matches!(
                o.shipping_status,
                cornershop_core::ShippingStatus::Cancelled
                    | cornershop_core::ShippingStatus::Returned
            )
        })
        .map(|o| o.total)
        .sum()
}

/// Compute the headline numbers from one snapshot of each collection.
#[must_use]
pub fn summarize(
    products: &[Product],
    categories: &[Category],
    orders: &[Order],
    coupons: &[Coupon],
    offers: &[Offer],
    now: DateTime<Utc>,
    currency: &str,
) -> DashboardMetrics {
    DashboardMetrics {
        products: products.len(),
        categories: categories.len(),
        orders: orders.len(),
        pending_orders: orders
            .iter()
            .filter(|o| !o.shipping_status.is_terminal())
            .count(),
        revenue: format_money(revenue(orders), currency),
        live_offers: offers.iter().filter(|o| o.is_live(now)).count(),
        usable_coupons: coupons.iter().filter(|c| c.is_usable(now)).count(),
        out_of_stock: products.iter().filter(|p| p.stock == 0).count(),
    }
}

/// Dashboard page handler.
#[instrument(skip(admin, state, session))]
pub async fn dashboard(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
) -> Result<Html<String>, AppError> {
    let api = state.api();
    let credentials = &admin.credentials;
    let (products, categories, orders, coupons, offers) = tokio::try_join!(
        api.list::<Product>(credentials),
        api.list::<Category>(credentials),
        api.orders(credentials),
        api.list::<Coupon>(credentials),
        api.list::<Offer>(credentials),
    )?;

    let currency = state.currency();
    let metrics = summarize(
        &products,
        &categories,
        &orders,
        &coupons,
        &offers,
        Utc::now(),
        currency,
    );

    let mut recent: Vec<&Order> = orders.iter().collect();
    recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    let recent_orders = recent
        .into_iter()
        .take(RECENT_ORDERS)
        .map(|o| OrderRowView::new(o, currency))
        .collect();

    let template = DashboardTemplate {
        admin_user: AdminUserView::from(&admin.admin),
        current_path: "/".to_string(),
        flash: take_flash(&session).await,
        metrics,
        recent_orders,
    };

    Ok(render(&template))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use cornershop_core::models::Address;
    use cornershop_core::{OfferId, OrderId, PaymentMethod, PaymentStatus, ShippingStatus};
    use rust_decimal::dec;

    use super::*;

    fn order(id: &str, total: Decimal, status: ShippingStatus) -> Order {
        Order {
            id: OrderId::new(id),
            user: None,
            items: vec![],
            shipping_address: Address::default(),
            payment_method: PaymentMethod::Cod,
            payment_status: PaymentStatus::Pending,
            shipping_status: status,
            subtotal: total,
            discount: Decimal::ZERO,
            shipping_fee: Decimal::ZERO,
            total,
            coupon_code: None,
            created_at: None,
        }
    }

    #[test]
    fn test_summary_excludes_cancelled_revenue() {
        let now = Utc.with_ymd_and_hms(2026, 6, 15, 12, 0, 0).unwrap();
        let orders = vec![
            order("a", dec!(100), ShippingStatus::Delivered),
            order("b", dec!(50.25), ShippingStatus::Pending),
            order("c", dec!(999), ShippingStatus::Cancelled),
            order("d", dec!(10), ShippingStatus::Returned),
        ];
        let offers = vec![Offer {
            id: OfferId::new("o1"),
            title: "Sale".to_string(),
            message: String::new(),
            discount_percentage: dec!(10),
            start_date: Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap(),
            end_date: Utc.with_ymd_and_hms(2026, 6, 30, 0, 0, 0).unwrap(),
            is_active: true,
        }];

        let metrics = summarize(&[], &[], &orders, &[], &offers, now, "$");
        assert_eq!(metrics.orders, 4);
        assert_eq!(metrics.pending_orders, 1);
        assert_eq!(metrics.revenue, "$150.25");
        assert_eq!(metrics.live_offers, 1);
        assert_eq!(metrics.usable_coupons, 0);
    }
}
