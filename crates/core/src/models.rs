//! Entity shapes returned by the backend API.
//!
//! These are snapshots for rendering and form binding only. The backend owns
//! every one of them; nothing here is written back except through explicit
//! API calls. JSON uses `camelCase` and ids come through as `_id`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{
    CategoryId, CouponId, DiscountType, OfferId, OrderId, PaymentMethod, PaymentStatus, ProductId,
    ShippingStatus, UserId, UserRole,
};

const fn default_true() -> bool {
    true
}

// =============================================================================
// Catalog
// =============================================================================

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    #[serde(rename = "_id", alias = "id")]
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

/// A product's category, either as a bare id or embedded by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CategoryRef {
    Id(CategoryId),
    Embedded(Category),
}

impl CategoryRef {
    /// The referenced category id.
    #[must_use]
    pub const fn id(&self) -> &CategoryId {
        match self {
            Self::Id(id) => id,
            Self::Embedded(category) => &category.id,
        }
    }

    /// The category name, when the backend embedded it.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Id(_) => None,
            Self::Embedded(category) => Some(&category.name),
        }
    }
}

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(rename = "_id", alias = "id")]
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    #[serde(default)]
    pub discount_price: Option<Decimal>,
    #[serde(default)]
    pub category: Option<CategoryRef>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub stock: u32,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub average_rating: Option<f64>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Product {
    /// The discount price when it undercuts the list price, otherwise the list price.
    #[must_use]
    pub fn effective_price(&self) -> Decimal {
        match self.discount_price {
            Some(discounted) if discounted > Decimal::ZERO && discounted < self.price => {
                discounted
            }
            _ => self.price,
        }
    }

    /// Whether the product is currently sold below its list price.
    #[must_use]
    pub fn is_discounted(&self) -> bool {
        self.effective_price() < self.price
    }

    /// First image, used for cards and cart lines.
    #[must_use]
    pub fn primary_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }

    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }

    /// Id of the product's category, if any.
    #[must_use]
    pub fn category_id(&self) -> Option<&CategoryId> {
        self.category.as_ref().map(CategoryRef::id)
    }
}

/// Aggregate rating for a product, plus the signed-in user's own rating.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingSummary {
    #[serde(default, alias = "averageRating")]
    pub average: f64,
    #[serde(default, alias = "totalRatings")]
    pub count: u32,
    #[serde(default)]
    pub user_rating: Option<u8>,
}

// =============================================================================
// Cart & wishlist
// =============================================================================

/// One line of a server-side cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub quantity: u32,
    #[serde(default)]
    pub image: Option<String>,
}

/// A user's cart as the backend returns it.
///
/// The backend appends a new line on every add, so the same product can
/// appear more than once. Use [`crate::cart::CartSummary`] to display it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub items: Vec<CartItem>,
}

/// A user's wishlist.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wishlist {
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub products: Vec<Product>,
}

// =============================================================================
// Users & addresses
// =============================================================================

/// A backend user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id", alias = "id")]
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub role: UserRole,
}

impl User {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// A shipping address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
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
}

impl Address {
    /// Lines for a printed or rendered address block, skipping empty parts.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        let locality = [self.city.as_str(), self.state.as_str(), self.postal_code.as_str()]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", ");

        [
            self.full_name.clone(),
            self.street.clone(),
            locality,
            self.country.clone(),
            self.phone.clone(),
        ]
        .into_iter()
        .filter(|line| !line.is_empty())
        .collect()
    }
}

// =============================================================================
// Orders & shipping
// =============================================================================

/// The customer embedded in an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCustomer {
    #[serde(rename = "_id", alias = "id")]
    pub id: UserId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

/// One purchased line of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub quantity: u32,
    #[serde(default)]
    pub image: Option<String>,
}

impl OrderItem {
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(rename = "_id", alias = "id")]
    pub id: OrderId,
    #[serde(default)]
    pub user: Option<OrderCustomer>,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub shipping_address: Address,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    #[serde(default, alias = "orderStatus", alias = "status")]
    pub shipping_status: ShippingStatus,
    #[serde(default)]
    pub subtotal: Decimal,
    #[serde(default)]
    pub discount: Decimal,
    #[serde(default)]
    pub shipping_fee: Decimal,
    #[serde(default)]
    pub total: Decimal,
    #[serde(default)]
    pub coupon_code: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Last eight characters of the id, uppercased, for compact display.
    #[must_use]
    pub fn short_id(&self) -> String {
        let id = self.id.as_str();
        let start = id.char_indices().rev().nth(7).map_or(0, |(i, _)| i);
        id.get(start..).unwrap_or(id).to_uppercase()
    }

    #[must_use]
    pub fn customer_name(&self) -> &str {
        self.user
            .as_ref()
            .map(|u| u.name.as_str())
            .filter(|n| !n.is_empty())
            .unwrap_or(self.shipping_address.full_name.as_str())
    }
}

/// One entry of an order's shipping history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingEvent {
    pub status: ShippingStatus,
    #[serde(alias = "date", alias = "updatedAt")]
    pub at: DateTime<Utc>,
    #[serde(default)]
    pub note: Option<String>,
}

/// Shipping record for an order (`GET /shipping/{orderId}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingInfo {
    pub order_id: OrderId,
    pub status: ShippingStatus,
    #[serde(default)]
    pub tracking_number: Option<String>,
    #[serde(default)]
    pub carrier: Option<String>,
    #[serde(default)]
    pub estimated_delivery: Option<DateTime<Utc>>,
    #[serde(default)]
    pub history: Vec<ShippingEvent>,
}

// =============================================================================
// Promotions
// =============================================================================

/// A discount coupon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coupon {
    #[serde(rename = "_id", alias = "id")]
    pub id: CouponId,
    pub code: String,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    #[serde(default)]
    pub min_purchase: Option<Decimal>,
    #[serde(default)]
    pub max_discount: Option<Decimal>,
    pub expiry_date: DateTime<Utc>,
    #[serde(default)]
    pub usage_limit: Option<u32>,
    #[serde(default)]
    pub used_count: u32,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl Coupon {
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiry_date < now
    }

    /// Whether the usage limit has been reached.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.usage_limit.is_some_and(|limit| self.used_count >= limit)
    }

    /// Active, unexpired and under its usage limit.
    #[must_use]
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        self.is_active && !self.is_expired(now) && !self.is_exhausted()
    }
}

/// Backend verdict for a coupon applied at checkout (`POST /coupon/validate`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponQuote {
    pub code: String,
    pub discount: Decimal,
    pub total: Decimal,
}

/// A promotional offer shown as a banner message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Offer {
    #[serde(rename = "_id", alias = "id")]
    pub id: OfferId,
    pub title: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub discount_percentage: Decimal,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl Offer {
    /// Active and within its date window (inclusive).
    #[must_use]
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.start_date <= now && now <= self.end_date
    }
}

// =============================================================================
// Shared request bodies
// =============================================================================

/// Credentials posted to `/user/login`.
#[derive(Debug, Clone, Serialize)]
pub struct LoginInput<'a> {
    pub email: &'a str,
    pub password: &'a str,
}
