//! Session-related types for admin authentication.
//!
//! Types stored in the session for authentication state.

use serde::{Deserialize, Serialize};

use cornershop_core::models::User;
use cornershop_core::{UserId, UserRole};

/// Session-stored admin identity.
///
/// Minimal data kept from the backend's login response to identify the
/// logged-in admin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentAdmin {
    /// Backend user ID.
    pub id: UserId,
    /// Admin's email address.
    pub email: String,
    /// Admin's display name.
    pub name: String,
    /// Backend role; anything but `admin` is refused.
    pub role: UserRole,
}

impl From<&User> for CurrentAdmin {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role,
        }
    }
}

impl CurrentAdmin {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// Session keys for admin authentication data.
pub mod keys {
    /// Key for storing the current logged-in admin.
    pub const CURRENT_ADMIN: &str = "current_admin";

    /// Key for the backend session cookie forwarded on the admin's behalf.
    pub const BACKEND_COOKIE: &str = "backend_cookie";

    /// Key for a one-shot notice shown after a redirect.
    pub const FLASH: &str = "flash";
}
