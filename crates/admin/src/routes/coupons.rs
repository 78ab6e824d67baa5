//! Coupon management route handlers.

use askama::Template;
use axum::{
    Form,
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use chrono::{DateTime, Utc};
use cornershop_core::models::Coupon;
use cornershop_core::validation::FieldErrors;
use cornershop_core::{CouponId, DiscountType, format_money};
use tower_sessions::Session;
use tracing::instrument;

use super::{AdminUserView, render, set_flash, take_flash};
use crate::error::AppError;
use crate::filters;
use crate::forms::CouponForm;
use crate::middleware::{AdminSession, RequireAdmin};
use crate::state::AppState;

const CURRENT_PATH: &str = "/coupons";

/// Coupon row in the listing.
#[derive(Debug, Clone)]
pub struct CouponView {
    pub id: String,
    pub code: String,
    pub value: String,
    pub conditions: String,
    pub usage: String,
    pub expires: String,
    pub status: &'static str,
    pub status_class: &'static str,
}

impl CouponView {
    fn new(coupon: &Coupon, now: DateTime<Utc>, currency: &str) -> Self {
        let value = match coupon.discount_type {
            DiscountType::Percentage => format!("{}%", coupon.discount_value.normalize()),
            DiscountType::Flat => format_money(coupon.discount_value, currency),
        };

        let mut conditions = Vec::new();
        if let Some(min) = coupon.min_purchase {
            conditions.push(format!("Min. {}", format_money(min, currency)));
        }
        if let Some(max) = coupon.max_discount {
            conditions.push(format!("Up to {}", format_money(max, currency)));
        }

        let usage = coupon.usage_limit.map_or_else(
            || format!("{} uses", coupon.used_count),
            |limit| format!("{}/{} uses", coupon.used_count, limit),
        );

        let (status, status_class) = if !coupon.is_active {
            ("Inactive", "badge badge-muted")
        } else if coupon.is_expired(now) {
            ("Expired", "badge badge-danger")
        } else if coupon.is_exhausted() {
            ("Used up", "badge badge-warning")
        } else {
            ("Active", "badge badge-success")
        };

        Self {
            id: coupon.id.to_string(),
            code: coupon.code.clone(),
            value,
            conditions: conditions.join(" · "),
            usage,
            expires: coupon.expiry_date.format("%b %-d, %Y").to_string(),
            status,
            status_class,
        }
    }
}

/// Discount type choice in the coupon form.
#[derive(Debug, Clone)]
pub struct DiscountTypeOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

fn discount_type_options(selected: &str) -> Vec<DiscountTypeOption> {
    DiscountType::ALL
        .iter()
        .map(|t| DiscountTypeOption {
            value: t.as_str(),
            label: t.label(),
            selected: t.as_str() == selected,
        })
        .collect()
}

/// Coupons list page template.
#[derive(Template)]
#[template(path = "coupons/index.html")]
pub struct CouponsIndexTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub flash: Option<String>,
    pub coupons: Vec<CouponView>,
}

/// Coupon create/edit form template.
#[derive(Template)]
#[template(path = "coupons/form.html")]
pub struct CouponFormTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub heading: String,
    pub action: String,
    pub discount_types: Vec<DiscountTypeOption>,
    pub form: CouponForm,
    pub errors: FieldErrors,
    pub error: Option<String>,
}

impl CouponFormTemplate {
    fn new(
        admin: &AdminSession,
        target: Option<&CouponId>,
        form: CouponForm,
        errors: FieldErrors,
        error: Option<String>,
    ) -> Self {
        let (heading, action) = target.map_or_else(
            || ("New coupon".to_string(), CURRENT_PATH.to_string()),
            |id| ("Edit coupon".to_string(), format!("{CURRENT_PATH}/{id}")),
        );
        Self {
            admin_user: AdminUserView::from(&admin.admin),
            current_path: CURRENT_PATH.to_string(),
            heading,
            action,
            discount_types: discount_type_options(&form.discount_type),
            form,
            errors,
            error,
        }
    }
}

/// Coupons list page handler.
#[instrument(skip(admin, state, session))]
pub async fn index(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
) -> Result<Html<String>, AppError> {
    let coupons = state.api().list::<Coupon>(&admin.credentials).await?;
    let now = Utc::now();

    let template = CouponsIndexTemplate {
        admin_user: AdminUserView::from(&admin.admin),
        current_path: CURRENT_PATH.to_string(),
        flash: take_flash(&session).await,
        coupons: coupons
            .iter()
            .map(|c| CouponView::new(c, now, state.currency()))
            .collect(),
    };

    Ok(render(&template))
}

/// New coupon form handler.
#[instrument(skip(admin))]
pub async fn new_coupon(RequireAdmin(admin): RequireAdmin) -> Html<String> {
    render(&CouponFormTemplate::new(
        &admin,
        None,
        CouponForm::blank(),
        FieldErrors::new(),
        None,
    ))
}

/// Create coupon handler.
#[instrument(skip(admin, state, session, form))]
pub async fn create(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CouponForm>,
) -> Result<Response, AppError> {
    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => {
            return Ok(
                render(&CouponFormTemplate::new(&admin, None, form, errors, None)).into_response(),
            );
        }
    };

    match state
        .api()
        .create::<Coupon, _>(&input, &admin.credentials)
        .await
    {
        Ok(()) => {
            tracing::info!(code = %input.code, "Coupon created");
            set_flash(&session, "Coupon created").await;
            Ok(Redirect::to(CURRENT_PATH).into_response())
        }
        Err(e) => match e.user_message().map(String::from) {
            Some(reason) => Ok(render(&CouponFormTemplate::new(
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

/// Edit coupon form handler.
#[instrument(skip(admin, state))]
pub async fn edit(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<CouponId>,
) -> Result<Html<String>, AppError> {
    let coupon = state
        .api()
        .fetch::<Coupon>(&id, &admin.credentials)
        .await?;

    Ok(render(&CouponFormTemplate::new(
        &admin,
        Some(&id),
        CouponForm::from(&coupon),
        FieldErrors::new(),
        None,
    )))
}

/// Update coupon handler.
#[instrument(skip(admin, state, session, form))]
pub async fn update(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<CouponId>,
    Form(form): Form<CouponForm>,
) -> Result<Response, AppError> {
    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => {
            return Ok(
                render(&CouponFormTemplate::new(&admin, Some(&id), form, errors, None))
                    .into_response(),
            );
        }
    };

    match state
        .api()
        .update::<Coupon, _>(&id, &input, &admin.credentials)
        .await
    {
        Ok(()) => {
            set_flash(&session, "Coupon updated").await;
            Ok(Redirect::to(CURRENT_PATH).into_response())
        }
        Err(e) => match e.user_message().map(String::from) {
            Some(reason) => Ok(render(&CouponFormTemplate::new(
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

/// Delete coupon handler.
#[instrument(skip(admin, state, session))]
pub async fn delete(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<CouponId>,
) -> Result<Redirect, AppError> {
    state
        .api()
        .delete::<Coupon>(&id, &admin.credentials)
        .await?;
    set_flash(&session, "Coupon deleted").await;
    Ok(Redirect::to(CURRENT_PATH))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use rust_decimal::dec;

    use super::*;

    fn coupon() -> Coupon {
        Coupon {
            id: CouponId::new("c1"),
            code: "TEN".to_string(),
            discount_type: DiscountType::Percentage,
            discount_value: dec!(10),
            min_purchase: Some(dec!(50)),
            max_discount: None,
            expiry_date: Utc.with_ymd_and_hms(2026, 12, 31, 23, 59, 59).unwrap(),
            usage_limit: Some(100),
            used_count: 100,
            is_active: true,
        }
    }

    #[test]
    fn test_coupon_view_status() {
        let now = Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap();
        let view = CouponView::new(&coupon(), now, "$");
        assert_eq!(view.value, "10%");
        assert_eq!(view.conditions, "Min. $50.00");
        assert_eq!(view.usage, "100/100 uses");
        assert_eq!(view.status, "Used up");
        assert_eq!(view.expires, "Dec 31, 2026");

        let later = Utc.with_ymd_and_hms(2027, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(CouponView::new(&coupon(), later, "$").status, "Expired");
    }

    #[test]
    fn test_flat_value_is_money() {
        let mut flat = coupon();
        flat.discount_type = DiscountType::Flat;
        flat.discount_value = dec!(5);
        let now = Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap();
        assert_eq!(CouponView::new(&flat, now, "$").value, "$5.00");
    }
}
