//! Order history and tracking for the signed-in shopper.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use cornershop_core::models::{Order, ShippingInfo};
use cornershop_core::{OrderId, ShippingStatus, format_money};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::session_keys;
use crate::state::AppState;
use crate::views::Layout;

fn format_date(at: Option<DateTime<Utc>>) -> String {
    at.map(|d| d.format("%b %-d, %Y").to_string())
        .unwrap_or_default()
}

/// Row in the order history list.
#[derive(Clone)]
pub struct OrderRowView {
    pub id: String,
    pub short_id: String,
    pub placed: String,
    pub item_count: u32,
    pub total: String,
    pub status_label: &'static str,
    pub status_class: &'static str,
}

impl OrderRowView {
    fn new(order: &Order, currency: &str) -> Self {
        Self {
            id: order.id.to_string(),
            short_id: order.short_id(),
            placed: format_date(order.created_at),
            item_count: order.item_count(),
            total: format_money(order.total, currency),
            status_label: order.shipping_status.label(),
            status_class: order.shipping_status.badge_class(),
        }
    }
}

/// Purchased line in the order detail.
#[derive(Clone)]
pub struct OrderLineView {
    pub product_id: String,
    pub name: String,
    pub image: Option<String>,
    pub quantity: u32,
    pub price: String,
    pub line_total: String,
}

/// One step of the shipping tracker.
#[derive(Clone)]
pub struct TrackerStep {
    pub label: &'static str,
    pub done: bool,
    pub current: bool,
}

/// One entry of the shipping history.
#[derive(Clone)]
pub struct HistoryView {
    pub label: &'static str,
    pub at: String,
    pub note: Option<String>,
}

/// Order detail display data.
#[derive(Clone)]
pub struct OrderDetailView {
    pub row: OrderRowView,
    pub lines: Vec<OrderLineView>,
    pub address: Vec<String>,
    pub payment_method: &'static str,
    pub payment_label: &'static str,
    pub payment_class: &'static str,
    pub subtotal: String,
    pub discount: Option<String>,
    pub shipping_fee: String,
    pub coupon_code: Option<String>,
}

/// Shipping tracker display data.
#[derive(Clone)]
pub struct TrackingView {
    pub steps: Vec<TrackerStep>,
    /// Set when the order left the normal path (cancelled, returned).
    pub off_track: Option<&'static str>,
    pub carrier: Option<String>,
    pub tracking_number: Option<String>,
    pub estimated_delivery: Option<String>,
    pub history: Vec<HistoryView>,
}

impl TrackingView {
    /// Build the tracker from the shipping record, or the order's own status
    /// when the backend has no record yet.
    fn new(status: ShippingStatus, info: Option<&ShippingInfo>) -> Self {
        let status = info.map_or(status, |i| i.status);
        let step = status.step();

        Self {
            steps: ShippingStatus::TRACK
                .iter()
                .enumerate()
                .map(|(i, s)| TrackerStep {
                    label: s.label(),
                    done: step.is_some_and(|at| i <= at),
                    current: step == Some(i),
                })
                .collect(),
            off_track: step.is_none().then(|| status.label()),
            carrier: info.and_then(|i| i.carrier.clone()),
            tracking_number: info.and_then(|i| i.tracking_number.clone()),
            estimated_delivery: info
                .and_then(|i| i.estimated_delivery)
                .map(|d| format_date(Some(d))),
            history: info
                .map(|i| {
                    i.history
                        .iter()
                        .map(|event| HistoryView {
                            label: event.status.label(),
                            at: event.at.format("%b %-d, %Y %H:%M").to_string(),
                            note: event.note.clone(),
                        })
                        .collect()
                })
                .unwrap_or_default(),
        }
    }
}

/// Order history page template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/index.html")]
pub struct OrdersTemplate {
    pub layout: Layout,
    pub orders: Vec<OrderRowView>,
}

/// Order detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/show.html")]
pub struct OrderShowTemplate {
    pub layout: Layout,
    pub flash: Option<String>,
    pub order: OrderDetailView,
    pub tracking: TrackingView,
}

/// Display the shopper's orders, newest first.
#[instrument(skip(state, shopper))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(shopper): RequireAuth,
) -> Result<impl IntoResponse, AppError> {
    let mut orders = state
        .api()
        .orders_for(&shopper.user.id, &shopper.credentials)
        .await?;
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    Ok(OrdersTemplate {
        layout: Layout::new(Some(&shopper)),
        orders: orders
            .iter()
            .map(|o| OrderRowView::new(o, state.currency()))
            .collect(),
    })
}

/// Display one order with its shipping tracker.
#[instrument(skip(state, session, shopper))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(shopper): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<impl IntoResponse, AppError> {
    let api = state.api();
    let (order, shipping) = tokio::try_join!(
        api.order(&id, &shopper.credentials),
        api.shipping(&id, &shopper.credentials)
    )?;

    // Another shopper's order id reads as not found
    if order
        .user
        .as_ref()
        .is_some_and(|u| u.id != shopper.user.id)
    {
        return Err(AppError::NotFound(format!("order {id}")));
    }

    let flash: Option<String> = session.remove(session_keys::FLASH).await?;
    let currency = state.currency();

    let detail = OrderDetailView {
        row: OrderRowView::new(&order, currency),
        lines: order
            .items
            .iter()
            .map(|item| OrderLineView {
                product_id: item.product_id.to_string(),
                name: item.name.clone(),
                image: item.image.clone(),
                quantity: item.quantity,
                price: format_money(item.price, currency),
                line_total: format_money(item.line_total(), currency),
            })
            .collect(),
        address: order.shipping_address.lines(),
        payment_method: order.payment_method.label(),
        payment_label: order.payment_status.label(),
        payment_class: order.payment_status.badge_class(),
        subtotal: format_money(order.subtotal, currency),
        discount: (!order.discount.is_zero()).then(|| format_money(order.discount, currency)),
        shipping_fee: format_money(order.shipping_fee, currency),
        coupon_code: order.coupon_code.clone(),
    };

    Ok(OrderShowTemplate {
        layout: Layout::new(Some(&shopper)),
        flash,
        order: detail,
        tracking: TrackingView::new(order.shipping_status, shipping.as_ref()),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_tracker_marks_progress() {
        let tracking = TrackingView::new(ShippingStatus::Shipped, None);
        let done: Vec<bool> = tracking.steps.iter().map(|s| s.done).collect();
        assert_eq!(done, [true, true, true, false, false]);
        assert!(tracking.steps[2].current);
        assert!(tracking.off_track.is_none());
    }

    #[test]
    fn test_tracker_prefers_shipping_record() {
        let info: ShippingInfo = serde_json::from_value(json!({
            "orderId": "o1",
            "status": "cancelled",
            "carrier": "DHL",
            "history": [
                {"status": "pending", "at": "2025-03-01T10:00:00Z"},
                {"status": "cancelled", "at": "2025-03-02T09:30:00Z", "note": "Customer request"}
            ]
        }))
        .unwrap();

        let tracking = TrackingView::new(ShippingStatus::Pending, Some(&info));
        assert_eq!(tracking.off_track, Some("Cancelled"));
        assert!(tracking.steps.iter().all(|s| !s.done));
        assert_eq!(tracking.carrier.as_deref(), Some("DHL"));
        assert_eq!(tracking.history.len(), 2);
        assert_eq!(tracking.history[1].at, "Mar 2, 2025 09:30");
    }
}
