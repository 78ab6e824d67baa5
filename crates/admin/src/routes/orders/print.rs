//! Printable order document.
//!
//! A standalone page without the admin chrome. A small script opens the
//! browser's print dialog once it loads.

use askama::Template;
use axum::{
    extract::{Path, State},
    response::Html,
};
use cornershop_core::OrderId;
use tracing::instrument;

use super::super::render;
use super::types::OrderDetailView;
use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireAdmin;
use crate::state::AppState;

/// Order print template.
#[derive(Template)]
#[template(path = "orders/print.html")]
pub struct OrderPrintTemplate {
    pub order: OrderDetailView,
    pub printed_at: String,
}

/// Print an order.
#[instrument(skip(admin, state))]
pub async fn print(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<Html<String>, AppError> {
    let order = state.api().order(&id, &admin.credentials).await?;

    let template = OrderPrintTemplate {
        order: OrderDetailView::new(&order, state.currency()),
        printed_at: chrono::Utc::now().format("%Y-%m-%d %H:%M UTC").to_string(),
    };

    Ok(render(&template))
}
