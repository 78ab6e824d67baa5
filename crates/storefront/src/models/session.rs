//! Session-related types.
//!
//! Types stored in the session for authentication state.

use serde::{Deserialize, Serialize};

use cornershop_core::models::User;
use cornershop_core::{UserId, UserRole};

/// Session-stored user identity.
///
/// Minimal data kept from the backend's login response. The backend cookie
/// that authorizes calls on this user's behalf lives under its own key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Backend user ID.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// User's email address.
    pub email: String,
    #[serde(default)]
    pub role: UserRole,
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

impl CurrentUser {
    /// First word of the name, for the header greeting.
    #[must_use]
    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or(&self.name)
    }
}

/// Session keys for authentication and browsing data.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the backend session cookie forwarded on the user's behalf.
    pub const BACKEND_COOKIE: &str = "backend_cookie";

    /// Key for the recently viewed product list.
    pub const RECENTLY_VIEWED: &str = "recently_viewed";

    /// Key for a one-shot flash message shown on the next page.
    pub const FLASH: &str = "flash";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_name() {
        let user = CurrentUser {
            id: UserId::new("u1"),
            name: "Ada King Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            role: UserRole::User,
        };
        assert_eq!(user.first_name(), "Ada");
    }
}
