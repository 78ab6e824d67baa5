//! Typed calls to the backend REST API for the admin dashboard.
//!
//! The four catalog resources (products, categories, coupons, offers) share
//! one CRUD shape, so [`AdminApi`] implements it once over [`Resource`].
//! Orders and shipping have their own calls. Every call carries the signed-in
//! admin's backend cookie.

use std::fmt::Display;

use cornershop_core::client::{ApiClient, ApiError, Credentials};
use cornershop_core::models::{
    Category, Coupon, LoginInput, Offer, Order, Product, ShippingInfo, User,
};
use cornershop_core::{CategoryId, CouponId, OfferId, OrderId, ProductId};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::instrument;

/// A backend collection with the standard list/get/create/update/delete routes.
pub trait Resource: DeserializeOwned + Send + 'static {
    /// Id newtype used in the item path.
    type Id: Display + Sync;

    /// Collection path, e.g. `/product`.
    const PATH: &'static str;

    /// Singular noun for logs and not-found messages.
    const NOUN: &'static str;
}

impl Resource for Product {
    type Id = ProductId;
    const PATH: &'static str = "/product";
    const NOUN: &'static str = "product";
}

impl Resource for Category {
    type Id = CategoryId;
    const PATH: &'static str = "/category";
    const NOUN: &'static str = "category";
}

impl Resource for Coupon {
    type Id = CouponId;
    const PATH: &'static str = "/coupon";
    const NOUN: &'static str = "coupon";
}

impl Resource for Offer {
    type Id = OfferId;
    const PATH: &'static str = "/offers";
    const NOUN: &'static str = "offer";
}

fn item_path<R: Resource>(id: &R::Id) -> String {
    format!("{}/{}", R::PATH, urlencoding::encode(&id.to_string()))
}

/// Admin client for the backend API.
#[derive(Clone)]
pub struct AdminApi {
    client: ApiClient,
}

impl AdminApi {
    #[must_use]
    pub const fn new(client: ApiClient) -> Self {
        Self { client }
    }

    // =========================================================================
    // Catalog resources
    // =========================================================================

    /// Every item in a collection.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`].
    #[instrument(skip(self, credentials), fields(resource = R::NOUN))]
    pub async fn list<R: Resource>(&self, credentials: &Credentials) -> Result<Vec<R>, ApiError> {
        self.client.get(R::PATH, Some(credentials)).await
    }

    /// # Errors
    ///
    /// Returns `ApiError::NotFound` for an unknown id.
    #[instrument(skip(self, credentials), fields(resource = R::NOUN, id = %id))]
    pub async fn fetch<R: Resource>(
        &self,
        id: &R::Id,
        credentials: &Credentials,
    ) -> Result<R, ApiError> {
        self.client.get(&item_path::<R>(id), Some(credentials)).await
    }

    /// # Errors
    ///
    /// Returns `ApiError::Rejected` when the backend refuses the record.
    #[instrument(skip(self, body, credentials), fields(resource = R::NOUN))]
    pub async fn create<R, B>(&self, body: &B, credentials: &Credentials) -> Result<(), ApiError>
    where
        R: Resource,
        B: Serialize + Sync,
    {
        self.client.post_unit(R::PATH, body, Some(credentials)).await?;
        tracing::info!(resource = R::NOUN, "Record created");
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `ApiError::Rejected` when the backend refuses the change.
    #[instrument(skip(self, body, credentials), fields(resource = R::NOUN, id = %id))]
    pub async fn update<R, B>(
        &self,
        id: &R::Id,
        body: &B,
        credentials: &Credentials,
    ) -> Result<(), ApiError>
    where
        R: Resource,
        B: Serialize + Sync,
    {
        self.client
            .put_unit(&item_path::<R>(id), body, Some(credentials))
            .await?;
        tracing::info!(resource = R::NOUN, id = %id, "Record updated");
        Ok(())
    }

    /// # Errors
    ///
    /// Any [`ApiError`].
    #[instrument(skip(self, credentials), fields(resource = R::NOUN, id = %id))]
    pub async fn delete<R: Resource>(
        &self,
        id: &R::Id,
        credentials: &Credentials,
    ) -> Result<(), ApiError> {
        self.client
            .delete(&item_path::<R>(id), Some(credentials))
            .await?;
        tracing::info!(resource = R::NOUN, id = %id, "Record deleted");
        Ok(())
    }

    // =========================================================================
    // Orders & shipping
    // =========================================================================

    /// Every order, newest first as the backend returns them.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`].
    #[instrument(skip(self, credentials))]
    pub async fn orders(&self, credentials: &Credentials) -> Result<Vec<Order>, ApiError> {
        self.client.get("/order", Some(credentials)).await
    }

    /// # Errors
    ///
    /// Returns `ApiError::NotFound` for an unknown id.
    #[instrument(skip(self, credentials))]
    pub async fn order(&self, id: &OrderId, credentials: &Credentials) -> Result<Order, ApiError> {
        self.client
            .get(
                &format!("/order/{}", urlencoding::encode(id.as_str())),
                Some(credentials),
            )
            .await
    }

    /// Shipping record for an order; `None` when none exists yet.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`] other than not found.
    #[instrument(skip(self, credentials))]
    pub async fn shipping(
        &self,
        id: &OrderId,
        credentials: &Credentials,
    ) -> Result<Option<ShippingInfo>, ApiError> {
        match self
            .client
            .get(
                &format!("/shipping/{}", urlencoding::encode(id.as_str())),
                Some(credentials),
            )
            .await
        {
            Ok(info) => Ok(Some(info)),
            Err(e) if e.is_not_found() || matches!(e, ApiError::MissingData) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// # Errors
    ///
    /// Returns `ApiError::Rejected` when the backend refuses the update.
    #[instrument(skip(self, update, credentials))]
    pub async fn update_shipping<B: Serialize + Sync>(
        &self,
        id: &OrderId,
        update: &B,
        credentials: &Credentials,
    ) -> Result<(), ApiError> {
        self.client
            .put_unit(
                &format!("/shipping/{}", urlencoding::encode(id.as_str())),
                update,
                Some(credentials),
            )
            .await?;
        tracing::info!(order_id = %id, "Shipping updated");
        Ok(())
    }

    // =========================================================================
    // Accounts
    // =========================================================================

    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` or `ApiError::Rejected` on bad credentials.
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

    /// # Errors
    ///
    /// Any [`ApiError`].
    #[instrument(skip(self, credentials))]
    pub async fn logout(&self, credentials: &Credentials) -> Result<(), ApiError> {
        self.client
            .post_unit("/user/logout", &serde_json::json!({}), Some(credentials))
            .await
    }

    /// Cheapest call that proves the backend answers.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`].
    pub async fn ping(&self) -> Result<(), ApiError> {
        self.client
            .get::<Vec<Category>>("/category", None)
            .await
            .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_paths() {
        assert_eq!(item_path::<Product>(&ProductId::new("p1")), "/product/p1");
        assert_eq!(item_path::<Offer>(&OfferId::new("o 1")), "/offers/o%201");
        assert_eq!(item_path::<Coupon>(&CouponId::new("c1")), "/coupon/c1");
        assert_eq!(item_path::<Category>(&CategoryId::new("k")), "/category/k");
    }
}
