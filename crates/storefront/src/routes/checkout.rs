//! Checkout route handlers.
//!
//! The order is assembled by the backend from the shopper's cart. This
//! module collects the shipping address, payment method and an optional
//! coupon, checks them, and posts the order.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use cornershop_core::cart::CartSummary;
use cornershop_core::client::ApiError;
use cornershop_core::models::{Address, CouponQuote};
use cornershop_core::validation::{self, FieldErrors};
use cornershop_core::{PaymentMethod, format_money};
use rust_decimal::Decimal;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::backend::NewOrder;
use crate::error::{AppError, add_breadcrumb, fragment_failure};
use crate::filters;
use crate::middleware::{RequireAuth, Shopper};
use crate::models::session_keys;
use crate::state::AppState;
use crate::views::{CartView, Layout};

/// Checkout form data.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckoutForm {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub postal_code: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub payment_method: String,
    #[serde(default)]
    pub coupon_code: String,
}

/// Coupon form data (HTMX apply button).
#[derive(Debug, Deserialize)]
pub struct CouponForm {
    #[serde(default)]
    pub coupon_code: String,
}

/// Payment method radio option.
#[derive(Clone)]
pub struct PaymentOption {
    pub value: &'static str,
    pub label: &'static str,
    pub checked: bool,
}

/// Order totals shown beside the form.
#[derive(Clone)]
pub struct TotalsView {
    pub subtotal: String,
    pub discount: Option<String>,
    pub total: String,
    pub coupon_code: Option<String>,
    pub coupon_error: Option<String>,
}

impl TotalsView {
    fn new(summary: &CartSummary, quote: Option<&CouponQuote>, currency: &str) -> Self {
        Self {
            subtotal: format_money(summary.total, currency),
            discount: quote
                .filter(|q| q.discount > Decimal::ZERO)
                .map(|q| format_money(q.discount, currency)),
            total: format_money(quote.map_or(summary.total, |q| q.total), currency),
            coupon_code: quote.map(|q| q.code.clone()),
            coupon_error: None,
        }
    }
}

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/show.html")]
pub struct CheckoutTemplate {
    pub layout: Layout,
    pub cart: CartView,
    pub totals: TotalsView,
    pub form: CheckoutForm,
    pub payment_options: Vec<PaymentOption>,
    pub errors: FieldErrors,
    pub error: Option<String>,
}

/// Totals fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/checkout_totals.html")]
pub struct TotalsTemplate {
    pub totals: TotalsView,
}

fn payment_options(selected: &str) -> Vec<PaymentOption> {
    let selected = selected.parse().unwrap_or_default();
    PaymentMethod::ALL
        .iter()
        .map(|m| PaymentOption {
            value: m.as_str(),
            label: m.label(),
            checked: *m == selected,
        })
        .collect()
}

/// Validated checkout input.
struct CheckoutInput {
    address: Address,
    payment_method: PaymentMethod,
}

/// The entered coupon code, trimmed and uppercased.
fn coupon_code(raw: &str) -> Option<String> {
    validation::optional(raw).map(|c| c.to_uppercase())
}

/// Check the form's fields. Messages go into `errors`.
fn validate(form: &CheckoutForm, errors: &mut FieldErrors) -> Option<CheckoutInput> {
    let full_name = validation::required(errors, "full_name", "Full name", &form.full_name);
    let phone = validation::required_phone(errors, "phone", &form.phone);
    let street = validation::required(errors, "street", "Street", &form.street);
    let city = validation::required(errors, "city", "City", &form.city);
    let state = validation::required(errors, "state", "State", &form.state);
    let postal_code =
        validation::required(errors, "postal_code", "Postal code", &form.postal_code);
    let country = validation::required(errors, "country", "Country", &form.country);
    let payment_method = form.payment_method.parse::<PaymentMethod>().ok();
    if payment_method.is_none() {
        errors.add("payment_method", "Choose a payment method");
    }
    Some(CheckoutInput {
        address: Address {
            full_name: full_name?,
            phone: phone?,
            street: street?,
            city: city?,
            state: state?,
            postal_code: postal_code?,
            country: country?,
        },
        payment_method: payment_method?,
    })
}

async fn load_cart(state: &AppState, shopper: &Shopper) -> Result<CartSummary, ApiError> {
    let cart = state
        .api()
        .cart(&shopper.user.id, &shopper.credentials)
        .await?;
    Ok(CartSummary::from(&cart))
}

/// Display the checkout form. An empty cart goes back to `/cart`.
#[instrument(skip(state, shopper))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(shopper): RequireAuth,
) -> Result<Response, AppError> {
    let summary = load_cart(&state, &shopper).await?;
    if summary.is_empty() {
        return Ok(Redirect::to("/cart").into_response());
    }

    let form = CheckoutForm {
        full_name: shopper.user.name.clone(),
        payment_method: PaymentMethod::default().as_str().to_string(),
        ..CheckoutForm::default()
    };

    Ok(CheckoutTemplate {
        layout: Layout::new(Some(&shopper)),
        cart: CartView::new(&summary, state.currency()),
        totals: TotalsView::new(&summary, None, state.currency()),
        payment_options: payment_options(&form.payment_method),
        form,
        errors: FieldErrors::new(),
        error: None,
    }
    .into_response())
}

/// Price the cart with a coupon (HTMX).
#[instrument(skip(state, shopper))]
pub async fn apply_coupon(
    State(state): State<AppState>,
    RequireAuth(shopper): RequireAuth,
    Form(form): Form<CouponForm>,
) -> Response {
    let summary = match load_cart(&state, &shopper).await {
        Ok(summary) => summary,
        Err(e) => return fragment_failure(&e, "Could not load your cart"),
    };
    let currency = state.currency();

    let Some(code) = coupon_code(&form.coupon_code) else {
        return TotalsTemplate {
            totals: TotalsView::new(&summary, None, currency),
        }
        .into_response();
    };

    let totals = match state
        .api()
        .validate_coupon(&code, summary.total, &shopper.credentials)
        .await
    {
        Ok(quote) => TotalsView::new(&summary, Some(&quote), currency),
        Err(e) if e.user_message().is_some() || matches!(e, ApiError::Rejected(_)) => TotalsView {
            coupon_error: Some(
                e.user_message()
                    .unwrap_or("This coupon cannot be applied")
                    .to_string(),
            ),
            ..TotalsView::new(&summary, None, currency)
        },
        Err(e) => return fragment_failure(&e, "Could not check that coupon"),
    };

    TotalsTemplate { totals }.into_response()
}

/// Validate the form and place the order.
#[instrument(skip(state, session, shopper, form))]
pub async fn place(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(shopper): RequireAuth,
    Form(form): Form<CheckoutForm>,
) -> Result<Response, AppError> {
    let summary = load_cart(&state, &shopper).await?;
    if summary.is_empty() {
        return Ok(Redirect::to("/cart").into_response());
    }
    let currency = state.currency();

    let mut errors = FieldErrors::new();
    let input = validate(&form, &mut errors);

    // A re-rendered form shows totals with any valid coupon applied
    let mut quote = None;
    if let Some(code) = coupon_code(&form.coupon_code) {
        match state
            .api()
            .validate_coupon(&code, summary.total, &shopper.credentials)
            .await
        {
            Ok(q) => quote = Some(q),
            Err(e @ (ApiError::Rejected(_) | ApiError::Status { status: 400..=499, .. })) => {
                errors.add(
                    "coupon_code",
                    e.user_message().unwrap_or("This coupon cannot be applied"),
                );
            }
            Err(e) => return Err(e.into()),
        }
    }

    let render = |errors: FieldErrors, error: Option<String>| CheckoutTemplate {
        layout: Layout::new(Some(&shopper)),
        cart: CartView::new(&summary, currency),
        totals: TotalsView::new(&summary, quote.as_ref(), currency),
        payment_options: payment_options(&form.payment_method),
        form: form.clone(),
        errors,
        error,
    };

    let input = match input {
        Some(input) if errors.is_empty() => input,
        _ => return Ok(render(errors, None).into_response()),
    };

    let order = NewOrder {
        user_id: &shopper.user.id,
        shipping_address: &input.address,
        payment_method: input.payment_method,
        coupon_code: quote.as_ref().map(|q| q.code.as_str()),
    };

    let placed = match state.api().place_order(&order, &shopper.credentials).await {
        Ok(placed) => placed,
        Err(e @ ApiError::Rejected(_)) => {
            tracing::warn!(error = %e, "Order refused");
            let message = e
                .user_message()
                .unwrap_or("We couldn't place your order")
                .to_string();
            return Ok(render(FieldErrors::new(), Some(message)).into_response());
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!(order_id = %placed.id, total = %placed.total, "Order placed");
    add_breadcrumb(
        "checkout",
        "Order placed",
        Some(&[("order_id", placed.id.as_str())]),
    );
    session
        .insert(session_keys::FLASH, "Thank you! Your order has been placed.")
        .await?;

    Ok(Redirect::to(&format!("/orders/{}", placed.id)).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled() -> CheckoutForm {
        CheckoutForm {
            full_name: "Ada Lovelace".to_string(),
            phone: "+44 20 7946 0958".to_string(),
            street: "12 St James's Square".to_string(),
            city: "London".to_string(),
            state: "Greater London".to_string(),
            postal_code: "SW1Y 4JH".to_string(),
            country: "UK".to_string(),
            payment_method: "cod".to_string(),
            coupon_code: " save10 ".to_string(),
        }
    }

    #[test]
    fn test_validate_accepts_complete_form() {
        let mut errors = FieldErrors::new();
        let input = validate(&filled(), &mut errors);
        assert!(errors.is_empty());
        let input = input.unwrap_or_else(|| panic!("form should validate"));
        assert_eq!(input.payment_method, PaymentMethod::Cod);
        assert_eq!(coupon_code(&filled().coupon_code).as_deref(), Some("SAVE10"));
        assert_eq!(input.address.city, "London");
    }

    #[test]
    fn test_validate_reports_each_field() {
        let form = CheckoutForm {
            phone: "call me".to_string(),
            payment_method: "barter".to_string(),
            ..CheckoutForm::default()
        };
        let mut errors = FieldErrors::new();
        assert!(validate(&form, &mut errors).is_none());
        assert_eq!(errors.get("full_name"), Some("Full name is required"));
        assert_eq!(errors.get("phone"), Some("Enter a valid phone number"));
        assert_eq!(errors.get("payment_method"), Some("Choose a payment method"));
        assert!(errors.has("country"));
    }
}
