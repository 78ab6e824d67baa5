//! Cornershop Core - Shared types and view logic.
//!
//! This crate provides what both Cornershop frontends share:
//! - `storefront` - Public-facing shop (catalog, cart, wishlist, checkout)
//! - `admin` - Internal dashboard for catalog, promotions and orders
//!
//! # Architecture
//!
//! The backend REST API owns every entity and business rule. This crate holds
//! the entity shapes it returns plus the small amount of logic the frontends
//! run on those snapshots: cart line grouping, catalog filtering, order table
//! filtering, pagination and form validation. All of that is pure.
//!
//! The only I/O lives behind the `client` feature, which adds the single HTTP
//! transport ([`client::ApiClient`]) used to talk to the backend.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, emails, money formatting, statuses
//! - [`models`] - Backend entity shapes
//! - [`api`] - The `{ success, data, message }` response envelope
//! - [`cart`], [`wishlist`], [`catalog`], [`orders`], [`recent`] - View logic
//! - [`pagination`], [`validation`] - Shared helpers for list and form pages

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod catalog;
#[cfg(feature = "client")]
pub mod client;
pub mod models;
pub mod orders;
pub mod pagination;
pub mod recent;
pub mod types;
pub mod validation;
pub mod wishlist;

pub use types::*;
