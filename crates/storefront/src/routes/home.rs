//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use cornershop_core::catalog::{SortOrder, sort_products};
use cornershop_core::models::{Category, Product};
use cornershop_core::recent::RecentlyViewed;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::AppError;
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::models::session_keys;
use crate::state::AppState;
use crate::views::{Layout, ProductCardView};

/// Number of products in the featured strip.
const FEATURED_COUNT: usize = 8;

/// Category tile display data.
#[derive(Clone)]
pub struct CategoryView {
    pub name: String,
    pub href: String,
    pub image: Option<String>,
}

impl From<&Category> for CategoryView {
    fn from(category: &Category) -> Self {
        Self {
            name: category.name.clone(),
            href: format!("/products?category={}", urlencoding::encode(category.id.as_str())),
            image: category.image.clone(),
        }
    }
}

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub layout: Layout,
    pub categories: Vec<CategoryView>,
    pub featured: Vec<ProductCardView>,
    pub recently_viewed: Vec<ProductCardView>,
}

/// Best-rated products first, newest breaking ties.
fn featured(mut products: Vec<Product>) -> Vec<Product> {
    sort_products(&mut products, SortOrder::Newest);
    sort_products(&mut products, SortOrder::Rating);
    products.truncate(FEATURED_COUNT);
    products
}

/// Display the home page.
#[instrument(skip(state, session, shopper))]
pub async fn home(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(shopper): OptionalAuth,
) -> Result<impl IntoResponse, AppError> {
    let api = state.api();
    let (categories, products) = tokio::try_join!(api.categories(), api.products())?;
    let currency = state.currency();

    let recent: RecentlyViewed = session
        .get(session_keys::RECENTLY_VIEWED)
        .await?
        .unwrap_or_default();
    let recently_viewed = recent
        .ids()
        .iter()
        .filter_map(|id| products.iter().find(|p| &p.id == id))
        .map(|p| ProductCardView::new(p, currency))
        .collect();

    Ok(HomeTemplate {
        layout: Layout::new(shopper.as_ref()),
        categories: categories.iter().map(CategoryView::from).collect(),
        featured: ProductCardView::list(&featured(products), currency),
        recently_viewed,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_featured_prefers_rating_then_recency() {
        let products: Vec<Product> = serde_json::from_value(json!([
            {"_id": "old", "name": "Old", "price": 1, "averageRating": 4.0, "createdAt": "2025-01-01T00:00:00Z"},
            {"_id": "new", "name": "New", "price": 1, "averageRating": 4.0, "createdAt": "2025-06-01T00:00:00Z"},
            {"_id": "top", "name": "Top", "price": 1, "averageRating": 5.0}
        ]))
        .unwrap();

        let ids: Vec<_> = featured(products).into_iter().map(|p| p.id.into_inner()).collect();
        assert_eq!(ids, ["top", "new", "old"]);
    }

    #[test]
    fn test_category_link_is_encoded() {
        let category: Category =
            serde_json::from_value(json!({"_id": "a b", "name": "Tea"})).unwrap();
        assert_eq!(CategoryView::from(&category).href, "/products?category=a%20b");
    }
}
