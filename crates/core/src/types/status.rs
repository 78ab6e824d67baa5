//! Status enums for orders, payments, coupons and users.
//!
//! The backend is not consistent about casing (`"Shipped"`, `"shipped"`,
//! `"out-for-delivery"`), so statuses parse leniently and always serialize in
//! `snake_case`.

use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error returned when a status string is not recognised.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {kind}: {value}")]
pub struct UnknownStatus {
    kind: &'static str,
    value: String,
}

/// Normalise `"Out For-Delivery"` and friends to `out_for_delivery`.
fn normalize(s: &str) -> String {
    s.trim()
        .chars()
        .map(|c| match c {
            ' ' | '-' => '_',
            c => c.to_ascii_lowercase(),
        })
        .collect()
}

macro_rules! string_enum {
    ($name:ident, $kind:literal) => {
        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl TryFrom<String> for $name {
            type Error = UnknownStatus;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.as_str().to_owned()
            }
        }

        impl FromStr for $name {
            type Err = UnknownStatus;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let normalized = normalize(s);
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str() == normalized)
                    .ok_or_else(|| UnknownStatus {
                        kind: $kind,
                        value: s.to_owned(),
                    })
            }
        }
    };
}

/// Shipping progress of an order.
///
/// The happy path runs `Pending → Processing → Shipped → OutForDelivery →
/// Delivered`. `Cancelled` and `Returned` end the order off that path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(try_from = "String", into = "String")]
pub enum ShippingStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    OutForDelivery,
    Delivered,
    Cancelled,
    Returned,
}

impl ShippingStatus {
    /// Every status, in display order.
    pub const ALL: [Self; 7] = [
        Self::Pending,
        Self::Processing,
        Self::Shipped,
        Self::OutForDelivery,
        Self::Delivered,
        Self::Cancelled,
        Self::Returned,
    ];

    /// The happy-path progression rendered by the order tracker.
    pub const TRACK: [Self; 5] = [
        Self::Pending,
        Self::Processing,
        Self::Shipped,
        Self::OutForDelivery,
        Self::Delivered,
    ];

    /// Wire value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::OutForDelivery => "out_for_delivery",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
            Self::Returned => "returned",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Processing => "Processing",
            Self::Shipped => "Shipped",
            Self::OutForDelivery => "Out for delivery",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
            Self::Returned => "Returned",
        }
    }

    /// Position on the tracker, or `None` for off-track statuses.
    #[must_use]
    pub fn step(self) -> Option<usize> {
        Self::TRACK.iter().position(|s| *s == self)
    }

    /// Whether no further shipping updates are expected.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled | Self::Returned)
    }

    /// CSS classes for the status badge.
    #[must_use]
    pub const fn badge_class(self) -> &'static str {
        match self {
            Self::Pending => "badge badge-muted",
            Self::Processing | Self::Shipped | Self::OutForDelivery => "badge badge-info",
            Self::Delivered => "badge badge-success",
            Self::Cancelled | Self::Returned => "badge badge-danger",
        }
    }
}

string_enum!(ShippingStatus, "shipping status");

/// Payment state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(try_from = "String", into = "String")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl PaymentStatus {
    /// Every status, in display order.
    pub const ALL: [Self; 4] = [Self::Pending, Self::Paid, Self::Failed, Self::Refunded];

    /// Wire value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Failed => "failed",
            Self::Refunded => "refunded",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Paid => "Paid",
            Self::Failed => "Failed",
            Self::Refunded => "Refunded",
        }
    }

    /// CSS classes for the status badge.
    #[must_use]
    pub const fn badge_class(self) -> &'static str {
        match self {
            Self::Pending => "badge badge-warning",
            Self::Paid => "badge badge-success",
            Self::Failed => "badge badge-danger",
            Self::Refunded => "badge badge-muted",
        }
    }
}

string_enum!(PaymentStatus, "payment status");

/// How the customer pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(try_from = "String", into = "String")]
pub enum PaymentMethod {
    /// Cash on delivery.
    #[default]
    Cod,
    /// Paid through the backend's payment gateway.
    Online,
}

impl PaymentMethod {
    pub const ALL: [Self; 2] = [Self::Cod, Self::Online];

    /// Wire value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cod => "cod",
            Self::Online => "online",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Cod => "Cash on delivery",
            Self::Online => "Online payment",
        }
    }
}

string_enum!(PaymentMethod, "payment method");

/// How a coupon reduces the order total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(try_from = "String", into = "String")]
pub enum DiscountType {
    #[default]
    Percentage,
    Flat,
}

impl DiscountType {
    pub const ALL: [Self; 2] = [Self::Percentage, Self::Flat];

    /// Wire value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Percentage => "percentage",
            Self::Flat => "flat",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Percentage => "Percentage",
            Self::Flat => "Flat amount",
        }
    }
}

string_enum!(DiscountType, "discount type");

/// Role of a backend user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(try_from = "String", into = "String")]
pub enum UserRole {
    #[default]
    User,
    /// Allowed into the admin dashboard.
    Admin,
}

impl UserRole {
    pub const ALL: [Self; 2] = [Self::User, Self::Admin];

    /// Wire value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }
}

string_enum!(UserRole, "user role");

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shipping_status_parses_leniently() {
        assert_eq!(
            "Out for delivery".parse::<ShippingStatus>().unwrap(),
            ShippingStatus::OutForDelivery
        );
        assert_eq!(
            "out-for-delivery".parse::<ShippingStatus>().unwrap(),
            ShippingStatus::OutForDelivery
        );
        assert_eq!(
            "SHIPPED".parse::<ShippingStatus>().unwrap(),
            ShippingStatus::Shipped
        );
        assert!("lost".parse::<ShippingStatus>().is_err());
    }

    #[test]
    fn test_shipping_status_serde_uses_snake_case() {
        let json = serde_json::to_string(&ShippingStatus::OutForDelivery).unwrap();
        assert_eq!(json, "\"out_for_delivery\"");

        let parsed: ShippingStatus = serde_json::from_str("\"Delivered\"").unwrap();
        assert_eq!(parsed, ShippingStatus::Delivered);

        assert!(serde_json::from_str::<ShippingStatus>("\"teleported\"").is_err());
    }

    #[test]
    fn test_shipping_status_tracker_steps() {
        assert_eq!(ShippingStatus::Pending.step(), Some(0));
        assert_eq!(ShippingStatus::Delivered.step(), Some(4));
        assert_eq!(ShippingStatus::Cancelled.step(), None);
        assert!(ShippingStatus::Returned.is_terminal());
        assert!(!ShippingStatus::Shipped.is_terminal());
    }

    #[test]
    fn test_payment_and_role_parse() {
        assert_eq!("Paid".parse::<PaymentStatus>().unwrap(), PaymentStatus::Paid);
        assert_eq!("COD".parse::<PaymentMethod>().unwrap(), PaymentMethod::Cod);
        assert_eq!("admin".parse::<UserRole>().unwrap(), UserRole::Admin);
        assert_eq!("flat".parse::<DiscountType>().unwrap(), DiscountType::Flat);
    }

    #[test]
    fn test_unknown_status_message() {
        let err = "maybe".parse::<PaymentStatus>().unwrap_err();
        assert_eq!(err.to_string(), "unknown payment status: maybe");
    }
}
