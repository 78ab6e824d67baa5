//! HTTP middleware stack for admin.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (added by the binary)
//! 2. `TraceLayer` (request span with status and latency)
//! 3. Request ID
//! 4. Security headers (stricter CSP for admin)
//! 5. Session layer (in-memory, SameSite=Strict)
//!
//! Authorization is not a layer: every protected handler takes
//! [`RequireAdmin`].

pub mod auth;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{AdminSession, RequireAdmin, clear_current_admin, set_current_admin};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
