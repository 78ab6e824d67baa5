//! Orders management route handlers.
//!
//! This module contains handlers for the order table, the detail view with
//! its shipping form, and the printable order document.

mod detail;
mod list;
mod print;
pub mod types;

// Re-export types needed by templates and other pages
pub use types::{OrderDetailView, OrderRowView};

pub use detail::{OrderShowTemplate, show, update_shipping};
pub use list::{OrdersIndexTemplate, index, page_href};
pub use print::{OrderPrintTemplate, print};
