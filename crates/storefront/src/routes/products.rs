//! Product route handlers.
//!
//! The catalog is fetched whole and narrowed here: search, category, price
//! range, sort and page all come from the query string, and every link on
//! the page is rebuilt from the same [`ProductQuery`] so filter state
//! survives reloads and sharing.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{OriginalUri, Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use cornershop_core::catalog::{ProductQuery, SortOrder, price_bounds};
use cornershop_core::models::{Category, Product, RatingSummary};
use cornershop_core::pagination::Page;
use cornershop_core::recent::RecentlyViewed;
use cornershop_core::{ProductId, format_money};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, add_breadcrumb};
use crate::filters;
use crate::middleware::{OptionalAuth, RequireAuth};
use crate::models::session_keys;
use crate::state::AppState;
use crate::views::{Layout, ProductCardView};

/// Category option in the filter form.
#[derive(Clone)]
pub struct CategoryOption {
    pub id: String,
    pub name: String,
    pub selected: bool,
}

/// Sort option in the filter form.
#[derive(Clone)]
pub struct SortOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

/// One numbered pagination link.
#[derive(Clone)]
pub struct PageLink {
    pub number: u32,
    pub href: String,
    pub current: bool,
}

/// Product detail display data.
#[derive(Clone)]
pub struct ProductDetailView {
    pub card: ProductCardView,
    pub description: String,
    pub images: Vec<String>,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub stock: u32,
}

/// Rating widget display data.
#[derive(Clone)]
pub struct RatingView {
    pub average: f64,
    pub average_label: String,
    pub count: u32,
    pub user_rating: Option<u8>,
}

impl From<&RatingSummary> for RatingView {
    fn from(summary: &RatingSummary) -> Self {
        Self {
            average: summary.average,
            average_label: format!("{:.1}", summary.average),
            count: summary.count,
            user_rating: summary.user_rating,
        }
    }
}

impl RatingView {
    /// Whether the shopper already gave this score.
    #[must_use]
    pub fn is_mine(&self, value: u8) -> bool {
        self.user_rating == Some(value)
    }
}

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub layout: Layout,
    pub products: Vec<ProductCardView>,
    pub q: String,
    pub min_price: String,
    pub max_price: String,
    pub price_hint: Option<String>,
    pub categories: Vec<CategoryOption>,
    pub sorts: Vec<SortOption>,
    pub filtered: bool,
    pub total_items: usize,
    pub first_index: usize,
    pub last_index: usize,
    pub prev_href: Option<String>,
    pub next_href: Option<String>,
    pub pages: Vec<PageLink>,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub layout: Layout,
    pub product: ProductDetailView,
    pub rating: RatingView,
    pub recently_viewed: Vec<ProductCardView>,
}

/// Rating form data.
#[derive(Debug, Deserialize)]
pub struct RatingForm {
    pub rating: u8,
}

/// Query string of the failed request, used for the retry link.
fn retry_target(uri: &axum::http::Uri) -> String {
    uri.path_and_query()
        .map_or_else(|| uri.path().to_string(), ToString::to_string)
}

fn category_options(categories: &[Category], selected: Option<&str>) -> Vec<CategoryOption> {
    categories
        .iter()
        .map(|c| CategoryOption {
            id: c.id.to_string(),
            name: c.name.clone(),
            selected: selected == Some(c.id.as_str()),
        })
        .collect()
}

fn page_links(query: &ProductQuery, page: &Page<Product>) -> Vec<PageLink> {
    (1..=page.total_pages)
        .map(|number| PageLink {
            number,
            href: query.with_page(number).href("/products"),
            current: number == page.page,
        })
        .collect()
}

/// Display product listing page.
///
/// On a backend failure the error page's retry link repeats this exact
/// request.
#[instrument(skip(state, shopper))]
pub async fn index(
    State(state): State<AppState>,
    OptionalAuth(shopper): OptionalAuth,
    OriginalUri(uri): OriginalUri,
    Query(query): Query<ProductQuery>,
) -> Response {
    let api = state.api();
    let fetched = tokio::try_join!(api.products(), api.categories());
    let (products, categories) = match fetched {
        Ok(fetched) => fetched,
        Err(e) => return AppError::Api(e).into_response_with_retry(retry_target(&uri)),
    };

    let currency = state.currency();
    let range = query.price_range();
    let price_hint = price_bounds(&products).map(|(lo, hi)| {
        format!(
            "{} – {}",
            format_money(lo, currency),
            format_money(hi, currency)
        )
    });

    let matched = query.apply(&products);
    let page = Page::new(matched, query.page, state.config().shop.products_per_page);

    ProductsIndexTemplate {
        layout: Layout::new(shopper.as_ref()),
        products: ProductCardView::list(&page.items, currency),
        q: query.q.clone().unwrap_or_default(),
        min_price: range.min.map(|d| d.normalize().to_string()).unwrap_or_default(),
        max_price: range.max.map(|d| d.normalize().to_string()).unwrap_or_default(),
        price_hint,
        categories: category_options(&categories, query.category.as_deref()),
        sorts: SortOrder::ALL
            .iter()
            .map(|s| SortOption {
                value: s.as_str(),
                label: s.label(),
                selected: *s == query.sort,
            })
            .collect(),
        filtered: query.is_filtered(),
        total_items: page.total_items,
        first_index: page.first_index(),
        last_index: page.last_index(),
        prev_href: page.prev().map(|p| query.with_page(p).href("/products")),
        next_href: page.next().map(|p| query.with_page(p).href("/products")),
        pages: page_links(&query, &page),
    }
    .into_response()
}

/// Remember a product view in the session.
async fn record_view(
    session: &Session,
    id: &ProductId,
    capacity: usize,
) -> Result<RecentlyViewed, tower_sessions::session::Error> {
    let mut recent: RecentlyViewed = session
        .get(session_keys::RECENTLY_VIEWED)
        .await?
        .unwrap_or_default();
    let before = recent.clone();
    recent.record(id.clone(), capacity);
    session
        .insert(session_keys::RECENTLY_VIEWED, &recent)
        .await?;
    Ok(before)
}

/// Display product detail page.
#[instrument(skip(state, session, shopper))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(shopper): OptionalAuth,
    Path(id): Path<ProductId>,
) -> Result<Response, AppError> {
    let api = state.api();
    let product = api.product(&id).await?;

    let rating = match api
        .rating(&id, shopper.as_ref().map(|s| &s.user.id))
        .await
    {
        Ok(summary) => summary,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to fetch rating");
            RatingSummary::default()
        }
    };

    let shop = &state.config().shop;
    let previously = record_view(&session, &id, shop.recently_viewed_limit).await?;

    // Resolve ids against the catalog; products that vanished are skipped
    let recently_viewed = if previously.excluding(&id).next().is_some() {
        match api.products().await {
            Ok(catalog) => previously
                .excluding(&id)
                .filter_map(|rid| catalog.iter().find(|p| &p.id == rid))
                .map(|p| ProductCardView::new(p, state.currency()))
                .collect(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to resolve recently viewed");
                Vec::new()
            }
        }
    } else {
        Vec::new()
    };

    add_breadcrumb(
        "navigation",
        "Viewed product page",
        Some(&[("product_id", id.as_str())]),
    );

    Ok(ProductShowTemplate {
        layout: Layout::new(shopper.as_ref()),
        product: ProductDetailView {
            card: ProductCardView::new(&product, state.currency()),
            description: product.description.clone(),
            images: product.images.clone(),
            brand: product.brand.clone(),
            category: product
                .category
                .as_ref()
                .and_then(|c| c.name())
                .map(String::from),
            stock: product.stock,
        },
        rating: RatingView::from(&rating),
        recently_viewed,
    }
    .into_response())
}

/// Submit the shopper's rating for a product.
#[instrument(skip(state, shopper))]
pub async fn rate(
    State(state): State<AppState>,
    RequireAuth(shopper): RequireAuth,
    Path(id): Path<ProductId>,
    Form(form): Form<RatingForm>,
) -> Result<Redirect, AppError> {
    if !(1..=5).contains(&form.rating) {
        return Err(AppError::BadRequest(
            "Rating must be between 1 and 5".to_string(),
        ));
    }

    state
        .api()
        .rate(&id, &shopper.user.id, form.rating, &shopper.credentials)
        .await?;

    Ok(Redirect::to(&format!("/products/{id}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_target_keeps_query() {
        let uri: axum::http::Uri = "/products?min_price=10&sort=price_asc".parse().unwrap();
        assert_eq!(retry_target(&uri), "/products?min_price=10&sort=price_asc");

        let uri: axum::http::Uri = "/products".parse().unwrap();
        assert_eq!(retry_target(&uri), "/products");
    }
}
