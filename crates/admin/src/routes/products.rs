//! Product management route handlers.

use askama::Template;
use axum::{
    Form,
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use cornershop_core::client::ApiError;
use cornershop_core::models::{Category, Product};
use cornershop_core::validation::FieldErrors;
use cornershop_core::{ProductId, format_money};
use tower_sessions::Session;
use tracing::instrument;

use super::{AdminUserView, render, set_flash, take_flash};
use crate::error::AppError;
use crate::filters;
use crate::forms::ProductForm;
use crate::middleware::{AdminSession, RequireAdmin};
use crate::state::AppState;

const CURRENT_PATH: &str = "/products";

/// Product row in the listing.
#[derive(Debug, Clone)]
pub struct ProductRowView {
    pub id: String,
    pub name: String,
    pub category: String,
    pub price: String,
    pub discount_price: Option<String>,
    pub stock: u32,
    pub low_stock: bool,
    pub image: Option<String>,
}

impl ProductRowView {
    fn new(product: &Product, categories: &[Category], currency: &str) -> Self {
        let category = product
            .category
            .as_ref()
            .and_then(|c| {
                c.name().map(String::from).or_else(|| {
                    categories
                        .iter()
                        .find(|k| &k.id == c.id())
                        .map(|k| k.name.clone())
                })
            })
            .unwrap_or_else(|| "—".to_string());

        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            category,
            price: format_money(product.price, currency),
            discount_price: product
                .is_discounted()
                .then(|| format_money(product.effective_price(), currency)),
            stock: product.stock,
            low_stock: product.stock < 5,
            image: product.primary_image().map(String::from),
        }
    }
}

/// Category choice in the product form.
#[derive(Debug, Clone)]
pub struct CategoryOption {
    pub id: String,
    pub name: String,
    pub selected: bool,
}

fn category_options(categories: &[Category], selected: &str) -> Vec<CategoryOption> {
    categories
        .iter()
        .map(|c| CategoryOption {
            id: c.id.to_string(),
            name: c.name.clone(),
            selected: c.id.as_str() == selected,
        })
        .collect()
}

/// Products list page template.
#[derive(Template)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub flash: Option<String>,
    pub products: Vec<ProductRowView>,
}

/// Product create/edit form template.
#[derive(Template)]
#[template(path = "products/form.html")]
pub struct ProductFormTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub heading: String,
    pub action: String,
    pub form: ProductForm,
    pub categories: Vec<CategoryOption>,
    pub errors: FieldErrors,
    pub error: Option<String>,
}

async fn form_page(
    state: &AppState,
    admin: &AdminSession,
    target: Option<&ProductId>,
    form: ProductForm,
    errors: FieldErrors,
    error: Option<String>,
) -> Result<Html<String>, AppError> {
    let categories = state.api().list::<Category>(&admin.credentials).await?;
    let (heading, action) = target.map_or_else(
        || ("New product".to_string(), CURRENT_PATH.to_string()),
        |id| ("Edit product".to_string(), format!("{CURRENT_PATH}/{id}")),
    );

    Ok(render(&ProductFormTemplate {
        admin_user: AdminUserView::from(&admin.admin),
        current_path: CURRENT_PATH.to_string(),
        heading,
        action,
        categories: category_options(&categories, &form.category),
        form,
        errors,
        error,
    }))
}

/// Re-render the form with the backend's reason, or fail the request.
async fn rejected(
    state: &AppState,
    admin: &AdminSession,
    target: Option<&ProductId>,
    form: ProductForm,
    err: ApiError,
) -> Result<Response, AppError> {
    match err.user_message().map(String::from) {
        Some(reason) => {
            tracing::warn!(error = %err, "Product rejected by backend");
            Ok(form_page(state, admin, target, form, FieldErrors::new(), Some(reason))
                .await?
                .into_response())
        }
        None => Err(err.into()),
    }
}

/// Products list page handler.
#[instrument(skip(admin, state, session))]
pub async fn index(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
) -> Result<Html<String>, AppError> {
    let api = state.api();
    let (products, categories) = tokio::try_join!(
        api.list::<Product>(&admin.credentials),
        api.list::<Category>(&admin.credentials),
    )?;

    let template = ProductsIndexTemplate {
        admin_user: AdminUserView::from(&admin.admin),
        current_path: CURRENT_PATH.to_string(),
        flash: take_flash(&session).await,
        products: products
            .iter()
            .map(|p| ProductRowView::new(p, &categories, state.currency()))
            .collect(),
    };

    Ok(render(&template))
}

/// New product form handler.
#[instrument(skip(admin, state))]
pub async fn new_product(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Html<String>, AppError> {
    let form = ProductForm {
        stock: "0".to_string(),
        ..ProductForm::default()
    };
    form_page(&state, &admin, None, form, FieldErrors::new(), None).await
}

/// Create product handler.
#[instrument(skip(admin, state, session, form))]
pub async fn create(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<ProductForm>,
) -> Result<Response, AppError> {
    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => {
            return Ok(form_page(&state, &admin, None, form, errors, None)
                .await?
                .into_response());
        }
    };

    match state.api().create::<Product, _>(&input, &admin.credentials).await {
        Ok(()) => {
            set_flash(&session, "Product created").await;
            Ok(Redirect::to(CURRENT_PATH).into_response())
        }
        Err(e) => rejected(&state, &admin, None, form, e).await,
    }
}

/// Edit product form handler.
#[instrument(skip(admin, state))]
pub async fn edit(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Html<String>, AppError> {
    let product = state
        .api()
        .fetch::<Product>(&id, &admin.credentials)
        .await?;
    form_page(
        &state,
        &admin,
        Some(&id),
        ProductForm::from(&product),
        FieldErrors::new(),
        None,
    )
    .await
}

/// Update product handler.
#[instrument(skip(admin, state, session, form))]
pub async fn update(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<ProductId>,
    Form(form): Form<ProductForm>,
) -> Result<Response, AppError> {
    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => {
            return Ok(form_page(&state, &admin, Some(&id), form, errors, None)
                .await?
                .into_response());
        }
    };

    match state
        .api()
        .update::<Product, _>(&id, &input, &admin.credentials)
        .await
    {
        Ok(()) => {
            set_flash(&session, "Product updated").await;
            Ok(Redirect::to(CURRENT_PATH).into_response())
        }
        Err(e) => rejected(&state, &admin, Some(&id), form, e).await,
    }
}

/// Delete product handler.
#[instrument(skip(admin, state, session))]
pub async fn delete(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<ProductId>,
) -> Result<Redirect, AppError> {
    state
        .api()
        .delete::<Product>(&id, &admin.credentials)
        .await?;
    set_flash(&session, "Product deleted").await;
    Ok(Redirect::to(CURRENT_PATH))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use cornershop_core::CategoryId;
    use cornershop_core::models::CategoryRef;
    use rust_decimal::dec;

    use super::*;

    fn product() -> Product {
        Product {
            id: ProductId::new("p1"),
            name: "Oolong".to_string(),
            description: String::new(),
            price: dec!(20),
            discount_price: Some(dec!(15)),
            category: Some(CategoryRef::Id(CategoryId::new("c1"))),
            images: vec![],
            stock: 3,
            brand: None,
            average_rating: None,
            created_at: None,
        }
    }

    #[test]
    fn test_row_resolves_category_name() {
        let categories = vec![Category {
            id: CategoryId::new("c1"),
            name: "Tea".to_string(),
            description: None,
            image: None,
        }];
        let row = ProductRowView::new(&product(), &categories, "$");
        assert_eq!(row.category, "Tea");
        assert_eq!(row.price, "$20.00");
        assert_eq!(row.discount_price.as_deref(), Some("$15.00"));
        assert!(row.low_stock);
    }

    #[test]
    fn test_category_options_mark_selection() {
        let categories = vec![
            Category {
                id: CategoryId::new("c1"),
                name: "Tea".to_string(),
                description: None,
                image: None,
            },
            Category {
                id: CategoryId::new("c2"),
                name: "Coffee".to_string(),
                description: None,
                image: None,
            },
        ];
        let options = category_options(&categories, "c2");
        assert!(!options.first().unwrap().selected);
        assert!(options.last().unwrap().selected);
    }
}
