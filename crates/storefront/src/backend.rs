//! Typed calls to the backend REST API for the storefront.
//!
//! [`ShopApi`] maps each storefront need onto one endpoint. Transport,
//! headers and envelope handling live in [`cornershop_core::client::ApiClient`].
//! The only local state is the offer banner cache.

use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;

use cornershop_core::client::{ApiClient, ApiError, Credentials};
use cornershop_core::models::{
    Address, Cart, Category, CouponQuote, LoginInput, Offer, Order, Product, RatingSummary,
    ShippingInfo, User, Wishlist,
};
use cornershop_core::{OrderId, PaymentMethod, ProductId, UserId};
use moka::future::Cache;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::instrument;

const OFFERS_KEY: &str = "offers";

/// Percent-encode one id for use as a backend path segment.
///
/// `.` and `..` survive encoding and would be resolved by the URL parser,
/// so they are refused along with the empty id.
fn segment(raw: &str) -> Result<Cow<'_, str>, ApiError> {
    if matches!(raw, "" | "." | "..") {
        return Err(ApiError::NotFound(format!("invalid id {raw:?}")));
    }
    Ok(urlencoding::encode(raw))
}

/// Storefront client for the backend API.
#[derive(Clone)]
pub struct ShopApi {
    client: ApiClient,
    offers: Cache<&'static str, Arc<Vec<Offer>>>,
}

// =============================================================================
// Request bodies
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AddToCartBody<'a> {
    user_id: &'a UserId,
    product_id: &'a ProductId,
    name: &'a str,
    #[serde(with = "rust_decimal::serde::float")]
    price: Decimal,
    quantity: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SetQuantityBody<'a> {
    product_id: &'a ProductId,
    quantity: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WishlistBody<'a> {
    user_id: &'a UserId,
    product_id: &'a ProductId,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RatingBody<'a> {
    user_id: &'a UserId,
    rating: u8,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CouponCheckBody<'a> {
    code: &'a str,
    #[serde(with = "rust_decimal::serde::float")]
    total: Decimal,
}

/// Registration form posted to `/user/register`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAccount<'a> {
    pub name: &'a str,
    pub email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<&'a str>,
    pub password: &'a str,
}

/// Order placed from the checkout form.
///
/// Line items are taken from the server-side cart by the backend.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder<'a> {
    pub user_id: &'a UserId,
    pub shipping_address: &'a Address,
    pub payment_method: PaymentMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coupon_code: Option<&'a str>,
}

/// Message posted from the contact form.
#[derive(Debug, Serialize)]
pub struct ContactMessage<'a> {
    pub name: &'a str,
    pub email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<&'a str>,
    pub message: &'a str,
}

impl ShopApi {
    /// Create a client whose offer cache entries live for `offer_ttl`.
    #[must_use]
    pub fn new(client: ApiClient, offer_ttl: Duration) -> Self {
        let offers = Cache::builder()
            .max_capacity(1)
            .time_to_live(offer_ttl)
            .build();
        Self { client, offers }
    }

    // -------------------------------------------------------------------------
    // Catalog
    // -------------------------------------------------------------------------

    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self))]
    pub async fn products(&self) -> Result<Vec<Product>, ApiError> {
        self.client.get("/product", None).await
    }

    /// # Errors
    ///
    /// Returns `ApiError::NotFound` for an unknown id.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn product(&self, id: &ProductId) -> Result<Product, ApiError> {
        let path = format!("/product/{}", segment(id.as_str())?);
        self.client.get(&path, None).await
    }

    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self))]
    pub async fn categories(&self) -> Result<Vec<Category>, ApiError> {
        self.client.get("/category", None).await
    }

    /// Live offers, served from the local cache when fresh.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the cache is cold and the request fails.
    #[instrument(skip(self))]
    pub async fn offers(&self) -> Result<Arc<Vec<Offer>>, ApiError> {
        if let Some(cached) = self.offers.get(OFFERS_KEY).await {
            return Ok(cached);
        }

        let offers: Vec<Offer> = self.client.get("/offers", None).await?;
        let offers = Arc::new(offers);
        self.offers.insert(OFFERS_KEY, Arc::clone(&offers)).await;
        tracing::debug!(count = offers.len(), "Offer cache refreshed");
        Ok(offers)
    }

    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn rating(
        &self,
        product_id: &ProductId,
        user_id: Option<&UserId>,
    ) -> Result<RatingSummary, ApiError> {
        let path = format!("/productRating/{}", segment(product_id.as_str())?);
        match user_id {
            Some(user) => {
                self.client
                    .get_with_query(&path, &[("userId", user.as_str())], None)
                    .await
            }
            None => self.client.get(&path, None).await,
        }
    }

    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self, credentials), fields(product_id = %product_id))]
    pub async fn rate(
        &self,
        product_id: &ProductId,
        user_id: &UserId,
        rating: u8,
        credentials: &Credentials,
    ) -> Result<(), ApiError> {
        self.client
            .put_unit(
                &format!("/productRating/{}", segment(product_id.as_str())?),
                &RatingBody { user_id, rating },
                Some(credentials),
            )
            .await
    }

    // -------------------------------------------------------------------------
    // Cart
    // -------------------------------------------------------------------------

    /// The user's cart. A user without one gets an empty cart.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self, credentials), fields(user_id = %user_id))]
    pub async fn cart(&self, user_id: &UserId, credentials: &Credentials) -> Result<Cart, ApiError> {
        let path = format!("/cart/{}", segment(user_id.as_str())?);
        match self.client.get(&path, Some(credentials)).await {
            Err(ApiError::NotFound(_) | ApiError::MissingData) => Ok(Cart::default()),
            other => other,
        }
    }

    /// Append `quantity` of a product to the cart.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self, product, credentials), fields(product_id = %product.id))]
    pub async fn add_to_cart(
        &self,
        user_id: &UserId,
        product: &Product,
        quantity: u32,
        credentials: &Credentials,
    ) -> Result<(), ApiError> {
        let body = AddToCartBody {
            user_id,
            product_id: &product.id,
            name: &product.name,
            price: product.effective_price(),
            quantity,
            image: product.primary_image(),
        };
        self.client.post_unit("/cart", &body, Some(credentials)).await
    }

    /// Set a product's total quantity in the cart.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self, credentials), fields(user_id = %user_id, product_id = %product_id))]
    pub async fn set_quantity(
        &self,
        user_id: &UserId,
        product_id: &ProductId,
        quantity: u32,
        credentials: &Credentials,
    ) -> Result<(), ApiError> {
        self.client
            .put_unit(
                &format!("/cart/{}", segment(user_id.as_str())?),
                &SetQuantityBody {
                    product_id,
                    quantity,
                },
                Some(credentials),
            )
            .await
    }

    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self, credentials), fields(user_id = %user_id, product_id = %product_id))]
    pub async fn remove_from_cart(
        &self,
        user_id: &UserId,
        product_id: &ProductId,
        credentials: &Credentials,
    ) -> Result<(), ApiError> {
        let path = format!(
            "/cart/{}/{}",
            segment(user_id.as_str())?,
            segment(product_id.as_str())?
        );
        self.client.delete(&path, Some(credentials)).await
    }

    // -------------------------------------------------------------------------
    // Wishlist
    // -------------------------------------------------------------------------

    /// The user's wishlist. A user without one gets an empty list.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self, credentials), fields(user_id = %user_id))]
    pub async fn wishlist(
        &self,
        user_id: &UserId,
        credentials: &Credentials,
    ) -> Result<Wishlist, ApiError> {
        let path = format!("/wishlist/{}", segment(user_id.as_str())?);
        match self.client.get(&path, Some(credentials)).await {
            Err(ApiError::NotFound(_) | ApiError::MissingData) => Ok(Wishlist::default()),
            other => other,
        }
    }

    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self, credentials), fields(user_id = %user_id, product_id = %product_id))]
    pub async fn add_to_wishlist(
        &self,
        user_id: &UserId,
        product_id: &ProductId,
        credentials: &Credentials,
    ) -> Result<(), ApiError> {
        self.client
            .post_unit(
                "/wishlist",
                &WishlistBody {
                    user_id,
                    product_id,
                },
                Some(credentials),
            )
            .await
    }

    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self, credentials), fields(user_id = %user_id, product_id = %product_id))]
    pub async fn remove_from_wishlist(
        &self,
        user_id: &UserId,
        product_id: &ProductId,
        credentials: &Credentials,
    ) -> Result<(), ApiError> {
        let path = format!(
            "/wishlist/{}/{}",
            segment(user_id.as_str())?,
            segment(product_id.as_str())?
        );
        self.client.delete(&path, Some(credentials)).await
    }

    // -------------------------------------------------------------------------
    // Orders & checkout
    // -------------------------------------------------------------------------

    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self, credentials), fields(user_id = %user_id))]
    pub async fn orders_for(
        &self,
        user_id: &UserId,
        credentials: &Credentials,
    ) -> Result<Vec<Order>, ApiError> {
        let path = format!("/order/user/{}", segment(user_id.as_str())?);
        self.client.get(&path, Some(credentials)).await
    }

    /// # Errors
    ///
    /// Returns `ApiError::NotFound` for an unknown id.
    #[instrument(skip(self, credentials), fields(order_id = %id))]
    pub async fn order(&self, id: &OrderId, credentials: &Credentials) -> Result<Order, ApiError> {
        let path = format!("/order/{}", segment(id.as_str())?);
        self.client.get(&path, Some(credentials)).await
    }

    /// Shipping record for an order, `None` before the backend creates one.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails for another reason.
    #[instrument(skip(self, credentials), fields(order_id = %id))]
    pub async fn shipping(
        &self,
        id: &OrderId,
        credentials: &Credentials,
    ) -> Result<Option<ShippingInfo>, ApiError> {
        let path = format!("/shipping/{}", segment(id.as_str())?);
        match self.client.get(&path, Some(credentials)).await {
            Ok(info) => Ok(Some(info)),
            Err(ApiError::NotFound(_) | ApiError::MissingData) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Ask the backend what a coupon is worth against `total`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Rejected` with the reason when the coupon is not valid.
    #[instrument(skip(self, credentials))]
    pub async fn validate_coupon(
        &self,
        code: &str,
        total: Decimal,
        credentials: &Credentials,
    ) -> Result<CouponQuote, ApiError> {
        self.client
            .post(
                "/coupon/validate",
                &CouponCheckBody { code, total },
                Some(credentials),
            )
            .await
    }

    /// # Errors
    ///
    /// Returns `ApiError` if the backend refuses the order.
    #[instrument(skip(self, order, credentials), fields(user_id = %order.user_id))]
    pub async fn place_order(
        &self,
        order: &NewOrder<'_>,
        credentials: &Credentials,
    ) -> Result<Order, ApiError> {
        self.client.post("/order", order, Some(credentials)).await
    }

    // -------------------------------------------------------------------------
    // Accounts
    // -------------------------------------------------------------------------

    /// Log in and capture the backend's session cookie.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` or `ApiError::Rejected` for bad credentials.
    #[instrument(skip(self, password))]
    pub async fn login(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(User, Option<Credentials>), ApiError> {
        self.client
            .post_for_credentials("/user/login", &LoginInput { email, password })
            .await
    }

    /// Create an account; the backend signs the new user in.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Rejected` when the backend refuses the account.
    #[instrument(skip(self, account), fields(email = account.email))]
    pub async fn register(
        &self,
        account: &NewAccount<'_>,
    ) -> Result<(User, Option<Credentials>), ApiError> {
        self.client
            .post_for_credentials("/user/register", account)
            .await
    }

    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self, credentials))]
    pub async fn logout(&self, credentials: &Credentials) -> Result<(), ApiError> {
        self.client
            .post_unit("/user/logout", &serde_json::json!({}), Some(credentials))
            .await
    }

    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self, message), fields(email = message.email))]
    pub async fn contact(&self, message: &ContactMessage<'_>) -> Result<(), ApiError> {
        self.client.post_unit("/contact", message, None).await
    }

    /// Cheap reachability probe for the readiness check.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the backend cannot be reached.
    pub async fn ping(&self) -> Result<(), ApiError> {
        self.categories().await.map(|_| ())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_encodes_separators() {
        assert_eq!(segment("p1").unwrap(), "p1");
        assert_eq!(segment("../category").unwrap(), "..%2Fcategory");
        assert_eq!(segment("a b?c").unwrap(), "a%20b%3Fc");
    }

    #[test]
    fn test_segment_refuses_dot_segments() {
        for raw in ["", ".", ".."] {
            assert!(segment(raw).unwrap_err().is_not_found(), "{raw:?}");
        }
    }
}
