//! Orders list page handler.
//!
//! All orders are fetched in one call, then filtered and paginated here.
//! Filter values and the page number live in the query string so every view
//! of the table is linkable.

use askama::Template;
use axum::{
    extract::{Query, State},
    response::Html,
};
use cornershop_core::models::Order;
use cornershop_core::orders::{OrderFilter, filter_orders};
use cornershop_core::pagination::Page;
use tower_sessions::Session;
use tracing::instrument;

use super::super::{AdminUserView, render, take_flash};
use super::types::{OrderRowView, PageLink, PageQuery};
use crate::components::data_table::{DataTableConfig, orders_table_config};
use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireAdmin;
use crate::state::AppState;

/// Orders list page template with data table support.
#[derive(Template)]
#[template(path = "orders/index.html")]
pub struct OrdersIndexTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub flash: Option<String>,
    /// Columns, filter controls and empty state.
    pub table: DataTableConfig,
    pub orders: Vec<OrderRowView>,
    pub total_items: usize,
    pub first_index: usize,
    pub last_index: usize,
    pub prev_href: Option<String>,
    pub next_href: Option<String>,
    pub pages: Vec<PageLink>,
    /// Link that drops every filter.
    pub clear_href: String,
}

/// `/orders` link for a filter and page; page 1 is left implicit.
#[must_use]
pub fn page_href(filter: &OrderFilter, page: u32) -> String {
    let query = filter.to_query_string();
    match (query.is_empty(), page > 1) {
        (true, false) => "/orders".to_string(),
        (true, true) => format!("/orders?page={page}"),
        (false, false) => format!("/orders?{query}"),
        (false, true) => format!("/orders?{query}&page={page}"),
    }
}

fn page_links(filter: &OrderFilter, page: &Page<&Order>) -> Vec<PageLink> {
    (1..=page.total_pages)
        .map(|number| PageLink {
            number,
            href: page_href(filter, number),
            current: number == page.page,
        })
        .collect()
}

/// Orders list page handler.
#[instrument(skip(admin, state, session))]
pub async fn index(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    Query(filter): Query<OrderFilter>,
    Query(paging): Query<PageQuery>,
) -> Result<Html<String>, AppError> {
    let orders = state.api().orders(&admin.credentials).await?;

    let matched = filter_orders(&orders, &filter);
    let page = Page::new(matched, paging.number(), state.config().orders_per_page);
    let currency = state.currency();

    let template = OrdersIndexTemplate {
        admin_user: AdminUserView::from(&admin.admin),
        current_path: "/orders".to_string(),
        flash: take_flash(&session).await,
        table: orders_table_config(&filter),
        orders: page
            .items
            .iter()
            .map(|o| OrderRowView::new(o, currency))
            .collect(),
        total_items: page.total_items,
        first_index: page.first_index(),
        last_index: page.last_index(),
        prev_href: page.prev().map(|p| page_href(&filter, p)),
        next_href: page.next().map(|p| page_href(&filter, p)),
        pages: page_links(&filter, &page),
        clear_href: "/orders".to_string(),
    };

    Ok(render(&template))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use cornershop_core::ShippingStatus;

    use super::*;

    #[test]
    fn test_page_href() {
        let none = OrderFilter::default();
        assert_eq!(page_href(&none, 1), "/orders");
        assert_eq!(page_href(&none, 2), "/orders?page=2");

        let filter = OrderFilter {
            shipping_status: Some(ShippingStatus::Delivered),
            ..OrderFilter::default()
        };
        assert_eq!(page_href(&filter, 1), "/orders?shipping_status=delivered");
        assert_eq!(
            page_href(&filter, 3),
            "/orders?shipping_status=delivered&page=3"
        );
    }
}
