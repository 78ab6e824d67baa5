//! Order detail page and shipping updates.

use askama::Template;
use axum::{
    Form,
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use cornershop_core::OrderId;
use cornershop_core::models::{Order, ShippingInfo};
use cornershop_core::validation::FieldErrors;
use tower_sessions::Session;
use tracing::instrument;

use super::super::{AdminUserView, render, set_flash, take_flash};
use super::types::{OrderDetailView, ShippingView, StatusOption, status_options};
use crate::error::AppError;
use crate::filters;
use crate::forms::ShippingForm;
use crate::middleware::{AdminSession, RequireAdmin};
use crate::state::AppState;

/// Order detail page template.
#[derive(Template)]
#[template(path = "orders/show.html")]
pub struct OrderShowTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub flash: Option<String>,
    pub order: OrderDetailView,
    pub shipping: Option<ShippingView>,
    pub statuses: Vec<StatusOption>,
    pub form: ShippingForm,
    pub errors: FieldErrors,
    pub error: Option<String>,
}

impl OrderShowTemplate {
    fn new(
        state: &AppState,
        admin: &AdminSession,
        order: &Order,
        shipping: Option<&ShippingInfo>,
        form: ShippingForm,
        errors: FieldErrors,
    ) -> Self {
        Self {
            admin_user: AdminUserView::from(&admin.admin),
            current_path: "/orders".to_string(),
            flash: None,
            order: OrderDetailView::new(order, state.currency()),
            shipping: shipping.map(ShippingView::from),
            statuses: status_options(&form.status),
            form,
            errors,
            error: None,
        }
    }
}

/// Fetch an order with its shipping record.
async fn load(
    state: &AppState,
    admin: &AdminSession,
    id: &OrderId,
) -> Result<(Order, Option<ShippingInfo>), AppError> {
    let api = state.api();
    let (order, shipping) = tokio::try_join!(
        api.order(id, &admin.credentials),
        api.shipping(id, &admin.credentials),
    )?;
    Ok((order, shipping))
}

/// Order detail page handler.
#[instrument(skip(admin, state, session))]
pub async fn show(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<OrderId>,
) -> Result<Html<String>, AppError> {
    let (order, shipping) = load(&state, &admin, &id).await?;
    let form = ShippingForm::prefill(shipping.as_ref(), order.shipping_status);

    let mut template = OrderShowTemplate::new(
        &state,
        &admin,
        &order,
        shipping.as_ref(),
        form,
        FieldErrors::new(),
    );
    template.flash = take_flash(&session).await;

    Ok(render(&template))
}

/// Update shipping handler.
#[instrument(skip(admin, state, session, form))]
pub async fn update_shipping(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<OrderId>,
    Form(form): Form<ShippingForm>,
) -> Result<Response, AppError> {
    let update = match form.validate() {
        Ok(update) => update,
        Err(errors) => {
            let (order, shipping) = load(&state, &admin, &id).await?;
            let template =
                OrderShowTemplate::new(&state, &admin, &order, shipping.as_ref(), form, errors);
            return Ok(render(&template).into_response());
        }
    };

    match state
        .api()
        .update_shipping(&id, &update, &admin.credentials)
        .await
    {
        Ok(()) => {
            tracing::info!(order_id = %id, status = %update.status, "Shipping status changed");
            set_flash(&session, "Shipping updated").await;
            Ok(Redirect::to(&format!("/orders/{id}")).into_response())
        }
        Err(e) => match e.user_message().map(String::from) {
            Some(reason) => {
                let (order, shipping) = load(&state, &admin, &id).await?;
                let mut template = OrderShowTemplate::new(
                    &state,
                    &admin,
                    &order,
                    shipping.as_ref(),
                    form,
                    FieldErrors::new(),
                );
                template.error = Some(reason);
                Ok(render(&template).into_response())
            }
            None => Err(e.into()),
        },
    }
}
