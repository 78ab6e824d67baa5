//! Admin form binding and validation.
//!
//! Each form binds every field as a raw string so a rejected submission can
//! be echoed back verbatim. `validate` either produces the JSON body the
//! backend expects or the per-field messages to show; nothing reaches the
//! backend until validation passes.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use cornershop_core::models::{Category, Coupon, Offer, Product, ShippingInfo};
use cornershop_core::validation::{
    FieldErrors, date, decimal_in_range, integer_in_range, length, optional,
    optional_decimal, optional_integer, positive_decimal, required,
};
use cornershop_core::{CategoryId, DiscountType, ShippingStatus};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Largest stock count the product form accepts.
pub const MAX_STOCK: i64 = 1_000_000;

const COUPON_CODE_LEN: (usize, usize) = (3, 20);
const OFFER_MAX_PERCENT: i64 = 90;

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

fn end_of_day(date: NaiveDate) -> Option<DateTime<Utc>> {
    date.and_hms_opt(23, 59, 59).map(|dt| dt.and_utc())
}

fn date_field(at: DateTime<Utc>) -> String {
    at.date_naive().format("%Y-%m-%d").to_string()
}

fn decimal_field(value: Decimal) -> String {
    value.normalize().to_string()
}

fn checkbox(checked: bool) -> Option<String> {
    checked.then(|| "on".to_string())
}

/// Optional date, blank allowed.
fn optional_date(errors: &mut FieldErrors, field: &str, label: &str, raw: &str) -> Option<NaiveDate> {
    if raw.trim().is_empty() {
        return None;
    }
    date(errors, field, label, raw)
}

// =============================================================================
// Products
// =============================================================================

/// Product create/edit form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProductForm {
    pub name: String,
    pub description: String,
    pub price: String,
    pub discount_price: String,
    pub stock: String,
    pub category: String,
    pub brand: String,
    /// One image URL per line.
    pub images: String,
}

/// Product body for `POST /product` and `PUT /product/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub name: String,
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub discount_price: Option<Decimal>,
    pub stock: u32,
    pub category: CategoryId,
    pub brand: Option<String>,
    pub images: Vec<String>,
}

impl From<&Product> for ProductForm {
    fn from(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            description: product.description.clone(),
            price: decimal_field(product.price),
            discount_price: product.discount_price.map(decimal_field).unwrap_or_default(),
            stock: product.stock.to_string(),
            category: product
                .category_id()
                .map(ToString::to_string)
                .unwrap_or_default(),
            brand: product.brand.clone().unwrap_or_default(),
            images: product.images.join("\n"),
        }
    }
}

/// Non-blank lines, each an absolute `http(s)` URL.
fn image_urls(errors: &mut FieldErrors, field: &str, raw: &str) -> Vec<String> {
    let mut urls = Vec::new();
    for (n, line) in raw
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .enumerate()
    {
        match url::Url::parse(line) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => urls.push(line.to_string()),
            _ => {
                errors.add(
                    field,
                    format!("Image {} is not a valid http(s) URL", n + 1),
                );
            }
        }
    }
    urls
}

impl ProductForm {
    /// # Errors
    ///
    /// Returns the field messages when any rule fails.
    pub fn validate(&self) -> Result<ProductInput, FieldErrors> {
        let mut errors = FieldErrors::new();

        let name = required(&mut errors, "name", "Name", &self.name);
        let price = positive_decimal(&mut errors, "price", "Price", &self.price);
        let discount_price =
            optional_decimal(&mut errors, "discount_price", "Discount price", &self.discount_price);
        if let Some(discount) = discount_price {
            if discount <= Decimal::ZERO {
                errors.add("discount_price", "Discount price must be greater than 0");
            } else if price.is_some_and(|p| discount >= p) {
                errors.add("discount_price", "Discount price must be less than the price");
            }
        }
        let stock = integer_in_range(&mut errors, "stock", "Stock", &self.stock, 0, MAX_STOCK)
            .and_then(|n| u32::try_from(n).ok());
        let category = required(&mut errors, "category", "Category", &self.category);
        let images = image_urls(&mut errors, "images", &self.images);

        match (name, price, stock, category) {
            (Some(name), Some(price), Some(stock), Some(category)) if errors.is_empty() => {
                Ok(ProductInput {
                    name,
                    description: self.description.trim().to_string(),
                    price,
                    discount_price,
                    stock,
                    category: CategoryId::new(category),
                    brand: optional(&self.brand),
                    images,
                })
            }
            _ => Err(errors),
        }
    }
}

// =============================================================================
// Categories
// =============================================================================

/// Category create/edit form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CategoryForm {
    pub name: String,
    pub description: String,
    pub image: String,
}

/// Category body for `POST /category` and `PUT /category/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryInput {
    pub name: String,
    pub description: Option<String>,
    pub image: Option<String>,
}

impl From<&Category> for CategoryForm {
    fn from(category: &Category) -> Self {
        Self {
            name: category.name.clone(),
            description: category.description.clone().unwrap_or_default(),
            image: category.image.clone().unwrap_or_default(),
        }
    }
}

impl CategoryForm {
    /// # Errors
    ///
    /// Returns the field messages when any rule fails.
    pub fn validate(&self) -> Result<CategoryInput, FieldErrors> {
        let mut errors = FieldErrors::new();
        let name = required(&mut errors, "name", "Name", &self.name);
        let image = optional(&self.image);
        if let Some(image) = image.as_deref() {
            if image_urls(&mut FieldErrors::new(), "image", image).is_empty() {
                errors.add("image", "Image must be a valid http(s) URL");
            }
        }

        match name {
            Some(name) if errors.is_empty() => Ok(CategoryInput {
                name,
                description: optional(&self.description),
                image,
            }),
            _ => Err(errors),
        }
    }
}

// =============================================================================
// Coupons
// =============================================================================

/// Coupon create/edit form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CouponForm {
    pub code: String,
    pub discount_type: String,
    pub discount_value: String,
    pub min_purchase: String,
    pub max_discount: String,
    /// `YYYY-MM-DD`; the coupon stays valid through the end of that day.
    pub expiry_date: String,
    pub usage_limit: String,
    /// Checkbox; present when ticked.
    pub is_active: Option<String>,
}

/// Coupon body for `POST /coupon` and `PUT /coupon/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponInput {
    pub code: String,
    pub discount_type: DiscountType,
    #[serde(with = "rust_decimal::serde::float")]
    pub discount_value: Decimal,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub min_purchase: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub max_discount: Option<Decimal>,
    pub expiry_date: DateTime<Utc>,
    pub usage_limit: Option<u32>,
    pub is_active: bool,
}

impl From<&Coupon> for CouponForm {
    fn from(coupon: &Coupon) -> Self {
        Self {
            code: coupon.code.clone(),
            discount_type: coupon.discount_type.as_str().to_string(),
            discount_value: decimal_field(coupon.discount_value),
            min_purchase: coupon.min_purchase.map(decimal_field).unwrap_or_default(),
            max_discount: coupon.max_discount.map(decimal_field).unwrap_or_default(),
            expiry_date: date_field(coupon.expiry_date),
            usage_limit: coupon.usage_limit.map(|n| n.to_string()).unwrap_or_default(),
            is_active: checkbox(coupon.is_active),
        }
    }
}

impl CouponForm {
    /// Blank form for a new coupon: percentage, active.
    #[must_use]
    pub fn blank() -> Self {
        Self {
            discount_type: DiscountType::Percentage.as_str().to_string(),
            is_active: checkbox(true),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn active(&self) -> bool {
        self.is_active.is_some()
    }

    /// Uppercased code, 3 to 20 of `A-Z`, `0-9`, `_` or `-`.
    fn code(&self, errors: &mut FieldErrors) -> Option<String> {
        let (min, max) = COUPON_CODE_LEN;
        let code = length(errors, "code", "Code", &self.code, min, max)?.to_ascii_uppercase();
        if code
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_' || c == '-')
        {
            Some(code)
        } else {
            errors.add("code", "Code may only contain letters, digits, _ and -");
            None
        }
    }

    /// # Errors
    ///
    /// Returns the field messages when any rule fails.
    pub fn validate(&self) -> Result<CouponInput, FieldErrors> {
        let mut errors = FieldErrors::new();

        let code = self.code(&mut errors);
        let discount_type = self.discount_type.parse::<DiscountType>().ok();
        let discount_value = match discount_type {
            Some(DiscountType::Percentage) => decimal_in_range(
                &mut errors,
                "discount_value",
                "Discount value",
                &self.discount_value,
                Decimal::ONE,
                Decimal::ONE_HUNDRED,
            ),
            Some(DiscountType::Flat) => positive_decimal(
                &mut errors,
                "discount_value",
                "Discount value",
                &self.discount_value,
            ),
            None => {
                errors.add("discount_type", "Choose a discount type");
                None
            }
        };

        let min_purchase =
            optional_decimal(&mut errors, "min_purchase", "Minimum purchase", &self.min_purchase);
        if min_purchase.is_some_and(|v| v < Decimal::ZERO) {
            errors.add("min_purchase", "Minimum purchase cannot be negative");
        }
        let max_discount =
            optional_decimal(&mut errors, "max_discount", "Maximum discount", &self.max_discount);
        if max_discount.is_some_and(|v| v <= Decimal::ZERO) {
            errors.add("max_discount", "Maximum discount must be greater than 0");
        }

        let expiry_date = date(&mut errors, "expiry_date", "Expiry date", &self.expiry_date)
            .and_then(end_of_day);
        let usage_limit = optional_integer(
            &mut errors,
            "usage_limit",
            "Usage limit",
            &self.usage_limit,
            1,
            i64::from(u32::MAX),
        )
        .and_then(|n| u32::try_from(n).ok());

        match (code, discount_type, discount_value, expiry_date) {
            (Some(code), Some(discount_type), Some(discount_value), Some(expiry_date))
                if errors.is_empty() =>
            {
                Ok(CouponInput {
                    code,
                    discount_type,
                    discount_value,
                    min_purchase,
                    max_discount,
                    expiry_date,
                    usage_limit,
                    is_active: self.active(),
                })
            }
            _ => Err(errors),
        }
    }
}

// =============================================================================
// Offers
// =============================================================================

/// Offer create/edit form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OfferForm {
    pub title: String,
    pub message: String,
    pub discount_percentage: String,
    pub start_date: String,
    pub end_date: String,
    pub is_active: Option<String>,
}

/// Offer body for `POST /offers` and `PUT /offers/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferInput {
    pub title: String,
    pub message: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub discount_percentage: Decimal,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub is_active: bool,
}

impl From<&Offer> for OfferForm {
    fn from(offer: &Offer) -> Self {
        Self {
            title: offer.title.clone(),
            message: offer.message.clone(),
            discount_percentage: decimal_field(offer.discount_percentage),
            start_date: date_field(offer.start_date),
            end_date: date_field(offer.end_date),
            is_active: checkbox(offer.is_active),
        }
    }
}

impl OfferForm {
    #[must_use]
    pub fn blank() -> Self {
        Self {
            is_active: checkbox(true),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn active(&self) -> bool {
        self.is_active.is_some()
    }

    /// # Errors
    ///
    /// Returns the field messages when any rule fails.
    pub fn validate(&self) -> Result<OfferInput, FieldErrors> {
        let mut errors = FieldErrors::new();

        let title = required(&mut errors, "title", "Title", &self.title);
        let message = required(&mut errors, "message", "Message", &self.message);
        let discount_percentage = decimal_in_range(
            &mut errors,
            "discount_percentage",
            "Discount percentage",
            &self.discount_percentage,
            Decimal::ONE,
            Decimal::from(OFFER_MAX_PERCENT),
        );
        let start = date(&mut errors, "start_date", "Start date", &self.start_date);
        let end = date(&mut errors, "end_date", "End date", &self.end_date);
        if let (Some(start), Some(end)) = (start, end) {
            if end < start {
                errors.add("end_date", "End date must be on or after the start date");
            }
        }

        match (
            title,
            message,
            discount_percentage,
            start.map(start_of_day),
            end.and_then(end_of_day),
        ) {
            (Some(title), Some(message), Some(discount_percentage), Some(start_date), Some(end_date))
                if errors.is_empty() =>
            {
                Ok(OfferInput {
                    title,
                    message,
                    discount_percentage,
                    start_date,
                    end_date,
                    is_active: self.active(),
                })
            }
            _ => Err(errors),
        }
    }
}

// =============================================================================
// Shipping
// =============================================================================

/// Shipping status form on the order detail page.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ShippingForm {
    pub status: String,
    pub carrier: String,
    pub tracking_number: String,
    pub estimated_delivery: String,
    pub note: String,
}

/// Body for `PUT /shipping/{orderId}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingUpdate {
    pub status: ShippingStatus,
    pub carrier: Option<String>,
    pub tracking_number: Option<String>,
    pub estimated_delivery: Option<DateTime<Utc>>,
    pub note: Option<String>,
}

impl ShippingForm {
    /// Prefill from the current shipping record, falling back to the
    /// order's own status when no record exists yet.
    #[must_use]
    pub fn prefill(info: Option<&ShippingInfo>, order_status: ShippingStatus) -> Self {
        info.map_or_else(
            || Self {
                status: order_status.as_str().to_string(),
                ..Self::default()
            },
            |info| Self {
                status: info.status.as_str().to_string(),
                carrier: info.carrier.clone().unwrap_or_default(),
                tracking_number: info.tracking_number.clone().unwrap_or_default(),
                estimated_delivery: info.estimated_delivery.map(date_field).unwrap_or_default(),
                note: String::new(),
            },
        )
    }

    /// # Errors
    ///
    /// Returns the field messages when any rule fails.
    pub fn validate(&self) -> Result<ShippingUpdate, FieldErrors> {
        let mut errors = FieldErrors::new();

        let status = match self.status.parse::<ShippingStatus>() {
            Ok(status) => Some(status),
            Err(_) => {
                errors.add("status", "Choose a shipping status");
                None
            }
        };
        let estimated_delivery = optional_date(
            &mut errors,
            "estimated_delivery",
            "Estimated delivery",
            &self.estimated_delivery,
        )
        .map(start_of_day);
        let note = optional(&self.note);
        if note.as_ref().is_some_and(|n| n.chars().count() > 500) {
            errors.add("note", "Note must be at most 500 characters");
        }

        match status {
            Some(status) if errors.is_empty() => Ok(ShippingUpdate {
                status,
                carrier: optional(&self.carrier),
                tracking_number: optional(&self.tracking_number),
                estimated_delivery,
                note,
            }),
            _ => Err(errors),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::dec;

    use super::*;

    fn product_form() -> ProductForm {
        ProductForm {
            name: "Green tea".into(),
            price: "12.50".into(),
            stock: "40".into(),
            category: "c1".into(),
            images: "https://img.example.com/a.jpg\n\n  https://img.example.com/b.jpg \n".into(),
            ..ProductForm::default()
        }
    }

    #[test]
    fn test_product_valid() {
        let input = product_form().validate().unwrap();
        assert_eq!(input.price, dec!(12.50));
        assert_eq!(input.stock, 40);
        assert_eq!(input.images.len(), 2);
        assert_eq!(input.discount_price, None);
        assert_eq!(input.brand, None);
    }

    #[test]
    fn test_product_rules() {
        let form = ProductForm {
            name: " ".into(),
            price: "0".into(),
            stock: "1000001".into(),
            category: String::new(),
            images: "ftp://files/a.png".into(),
            ..ProductForm::default()
        };
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.get("name"), Some("Name is required"));
        assert_eq!(errors.get("price"), Some("Price must be greater than 0"));
        assert_eq!(errors.get("stock"), Some("Stock must be between 0 and 1000000"));
        assert_eq!(errors.get("category"), Some("Category is required"));
        assert!(errors.has("images"));
    }

    #[test]
    fn test_discount_price_below_price() {
        let mut form = product_form();
        form.discount_price = "12.50".into();
        let errors = form.validate().unwrap_err();
        assert_eq!(
            errors.get("discount_price"),
            Some("Discount price must be less than the price")
        );

        form.discount_price = "9.99".into();
        assert_eq!(form.validate().unwrap().discount_price, Some(dec!(9.99)));
    }

    #[test]
    fn test_product_body_is_camel_case_with_numbers() {
        let mut form = product_form();
        form.discount_price = "10".into();
        let body = serde_json::to_value(form.validate().unwrap()).unwrap();
        assert_eq!(body["price"], serde_json::json!(12.5));
        assert_eq!(body["discountPrice"], serde_json::json!(10.0));
        assert_eq!(body["category"], "c1");
    }

    #[test]
    fn test_category_requires_name() {
        let errors = CategoryForm::default().validate().unwrap_err();
        assert_eq!(errors.get("name"), Some("Name is required"));

        let input = CategoryForm {
            name: "Tea".into(),
            ..CategoryForm::default()
        }
        .validate()
        .unwrap();
        assert_eq!(input.name, "Tea");
        assert_eq!(input.description, None);
    }

    fn coupon_form() -> CouponForm {
        CouponForm {
            code: "spring-10".into(),
            discount_value: "10".into(),
            expiry_date: "2026-05-31".into(),
            ..CouponForm::blank()
        }
    }

    #[test]
    fn test_coupon_code_is_uppercased() {
        let input = coupon_form().validate().unwrap();
        assert_eq!(input.code, "SPRING-10");
        assert!(input.is_active);
        assert_eq!(input.expiry_date.to_rfc3339(), "2026-05-31T23:59:59+00:00");
    }

    #[test]
    fn test_coupon_code_rules() {
        let mut form = coupon_form();
        form.code = "AB".into();
        assert_eq!(
            form.validate().unwrap_err().get("code"),
            Some("Code must be between 3 and 20 characters")
        );

        form.code = "TEN OFF".into();
        assert_eq!(
            form.validate().unwrap_err().get("code"),
            Some("Code may only contain letters, digits, _ and -")
        );
    }

    #[test]
    fn test_coupon_value_depends_on_type() {
        let mut form = coupon_form();
        form.discount_value = "150".into();
        assert!(form.validate().unwrap_err().has("discount_value"));

        form.discount_type = "flat".into();
        assert_eq!(form.validate().unwrap().discount_value, dec!(150));

        form.discount_value = "0".into();
        assert_eq!(
            form.validate().unwrap_err().get("discount_value"),
            Some("Discount value must be greater than 0")
        );
    }

    #[test]
    fn test_coupon_requires_expiry() {
        let mut form = coupon_form();
        form.expiry_date = String::new();
        assert_eq!(
            form.validate().unwrap_err().get("expiry_date"),
            Some("Expiry date is required")
        );
    }

    #[test]
    fn test_unticked_checkbox_is_inactive() {
        let mut form = coupon_form();
        form.is_active = None;
        assert!(!form.validate().unwrap().is_active);
    }

    fn offer_form() -> OfferForm {
        OfferForm {
            title: "Summer sale".into(),
            message: "20% off everything".into(),
            discount_percentage: "20".into(),
            start_date: "2026-06-01".into(),
            end_date: "2026-06-30".into(),
            ..OfferForm::blank()
        }
    }

    #[test]
    fn test_offer_window() {
        let input = offer_form().validate().unwrap();
        assert_eq!(input.start_date.to_rfc3339(), "2026-06-01T00:00:00+00:00");
        assert_eq!(input.end_date.to_rfc3339(), "2026-06-30T23:59:59+00:00");

        let mut same_day = offer_form();
        same_day.end_date = "2026-06-01".into();
        assert!(same_day.validate().is_ok());

        let mut reversed = offer_form();
        reversed.end_date = "2026-05-31".into();
        assert_eq!(
            reversed.validate().unwrap_err().get("end_date"),
            Some("End date must be on or after the start date")
        );
    }

    #[test]
    fn test_offer_percentage_cap() {
        let mut form = offer_form();
        form.discount_percentage = "91".into();
        assert_eq!(
            form.validate().unwrap_err().get("discount_percentage"),
            Some("Discount percentage must be between 1 and 90")
        );
        form.title = String::new();
        assert_eq!(
            form.validate().unwrap_err().get("title"),
            Some("Title is required")
        );
    }

    #[test]
    fn test_shipping_form() {
        let form = ShippingForm {
            status: "Out for delivery".into(),
            tracking_number: " 1Z999 ".into(),
            ..ShippingForm::default()
        };
        let update = form.validate().unwrap();
        assert_eq!(update.status, ShippingStatus::OutForDelivery);
        assert_eq!(update.tracking_number.as_deref(), Some("1Z999"));
        assert_eq!(update.carrier, None);

        let bad = ShippingForm {
            status: "lost".into(),
            estimated_delivery: "soon".into(),
            ..ShippingForm::default()
        };
        let errors = bad.validate().unwrap_err();
        assert!(errors.has("status"));
        assert!(errors.has("estimated_delivery"));
    }

    #[test]
    fn test_shipping_prefill_without_record() {
        let form = ShippingForm::prefill(None, ShippingStatus::Processing);
        assert_eq!(form.status, "processing");
        assert!(form.carrier.is_empty());
    }
}
