//! Category management route handlers.

use askama::Template;
use axum::{
    Form,
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use cornershop_core::CategoryId;
use cornershop_core::models::{Category, Product};
use cornershop_core::validation::FieldErrors;
use tower_sessions::Session;
use tracing::instrument;

use super::{AdminUserView, render, set_flash, take_flash};
use crate::error::AppError;
use crate::filters;
use crate::forms::CategoryForm;
use crate::middleware::{AdminSession, RequireAdmin};
use crate::state::AppState;

const CURRENT_PATH: &str = "/categories";

/// Category row in the listing.
#[derive(Debug, Clone)]
pub struct CategoryRowView {
    pub id: String,
    pub name: String,
    pub description: String,
    pub image: Option<String>,
    pub product_count: usize,
}

impl CategoryRowView {
    fn new(category: &Category, products: &[Product]) -> Self {
        Self {
            id: category.id.to_string(),
            name: category.name.clone(),
            description: category.description.clone().unwrap_or_default(),
            image: category.image.clone(),
            product_count: products
                .iter()
                .filter(|p| p.category_id() == Some(&category.id))
                .count(),
        }
    }
}

/// Categories list page template.
#[derive(Template)]
#[template(path = "categories/index.html")]
pub struct CategoriesIndexTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub flash: Option<String>,
    pub categories: Vec<CategoryRowView>,
}

/// Category create/edit form template.
#[derive(Template)]
#[template(path = "categories/form.html")]
pub struct CategoryFormTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub heading: String,
    pub action: String,
    pub form: CategoryForm,
    pub errors: FieldErrors,
    pub error: Option<String>,
}

impl CategoryFormTemplate {
    fn new(
        admin: &AdminSession,
        target: Option<&CategoryId>,
        form: CategoryForm,
        errors: FieldErrors,
        error: Option<String>,
    ) -> Self {
        let (heading, action) = target.map_or_else(
            || ("New category".to_string(), CURRENT_PATH.to_string()),
            |id| ("Edit category".to_string(), format!("{CURRENT_PATH}/{id}")),
        );
        Self {
            admin_user: AdminUserView::from(&admin.admin),
            current_path: CURRENT_PATH.to_string(),
            heading,
            action,
            form,
            errors,
            error,
        }
    }
}

/// Categories list page handler.
#[instrument(skip(admin, state, session))]
pub async fn index(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
) -> Result<Html<String>, AppError> {
    let api = state.api();
    let (categories, products) = tokio::try_join!(
        api.list::<Category>(&admin.credentials),
        api.list::<Product>(&admin.credentials),
    )?;

    let template = CategoriesIndexTemplate {
        admin_user: AdminUserView::from(&admin.admin),
        current_path: CURRENT_PATH.to_string(),
        flash: take_flash(&session).await,
        categories: categories
            .iter()
            .map(|c| CategoryRowView::new(c, &products))
            .collect(),
    };

    Ok(render(&template))
}

/// New category form handler.
#[instrument(skip(admin))]
pub async fn new_category(RequireAdmin(admin): RequireAdmin) -> Html<String> {
    render(&CategoryFormTemplate::new(
        &admin,
        None,
        CategoryForm::default(),
        FieldErrors::new(),
        None,
    ))
}

/// Create category handler.
///
/// Validation runs first; an invalid form never reaches the backend.
#[instrument(skip(admin, state, session, form))]
pub async fn create(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CategoryForm>,
) -> Result<Response, AppError> {
    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => {
            return Ok(
                render(&CategoryFormTemplate::new(&admin, None, form, errors, None))
                    .into_response(),
            );
        }
    };

    match state
        .api()
        .create::<Category, _>(&input, &admin.credentials)
        .await
    {
        Ok(()) => {
            set_flash(&session, "Category created").await;
            Ok(Redirect::to(CURRENT_PATH).into_response())
        }
        Err(e) => match e.user_message().map(String::from) {
            Some(reason) => Ok(render(&CategoryFormTemplate::new(
                &admin,
                None,
                form,
                FieldErrors::new(),
                Some(reason),
            ))
            .into_response()),
            None => Err(e.into()),
        },
    }
}

/// Edit category form handler.
#[instrument(skip(admin, state))]
pub async fn edit(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
) -> Result<Html<String>, AppError> {
    let category = state
        .api()
        .fetch::<Category>(&id, &admin.credentials)
        .await?;

    Ok(render(&CategoryFormTemplate::new(
        &admin,
        Some(&id),
        CategoryForm::from(&category),
        FieldErrors::new(),
        None,
    )))
}

/// Update category handler.
#[instrument(skip(admin, state, session, form))]
pub async fn update(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<CategoryId>,
    Form(form): Form<CategoryForm>,
) -> Result<Response, AppError> {
    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => {
            return Ok(
                render(&CategoryFormTemplate::new(&admin, Some(&id), form, errors, None))
                    .into_response(),
            );
        }
    };

    match state
        .api()
        .update::<Category, _>(&id, &input, &admin.credentials)
        .await
    {
        Ok(()) => {
            set_flash(&session, "Category updated").await;
            Ok(Redirect::to(CURRENT_PATH).into_response())
        }
        Err(e) => match e.user_message().map(String::from) {
            Some(reason) => Ok(render(&CategoryFormTemplate::new(
                &admin,
                Some(&id),
                form,
                FieldErrors::new(),
                Some(reason),
            ))
            .into_response()),
            None => Err(e.into()),
        },
    }
}

/// Delete category handler.
#[instrument(skip(admin, state, session))]
pub async fn delete(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<CategoryId>,
) -> Result<Redirect, AppError> {
    state
        .api()
        .delete::<Category>(&id, &admin.credentials)
        .await?;
    set_flash(&session, "Category deleted").await;
    Ok(Redirect::to(CURRENT_PATH))
}
