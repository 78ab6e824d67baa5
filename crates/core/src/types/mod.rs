//! Core types for Cornershop.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod price;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use price::{DEFAULT_CURRENCY_SYMBOL, format_money, percent_off};
pub use status::*;
