//! Data table component types.
//!
//! These types describe the filter bar, columns and empty state of a list
//! table. The filter controls carry their current values so the rendered
//! form reflects the query string it was loaded from.

use cornershop_core::orders::OrderFilter;
use cornershop_core::{PaymentStatus, ShippingStatus};

/// Column definition for a data table.
#[derive(Debug, Clone)]
pub struct TableColumn {
    /// Unique key for the column.
    pub key: String,
    /// Display label for the column header.
    pub label: String,
    /// Right-align numeric cells.
    pub numeric: bool,
}

impl TableColumn {
    #[must_use]
    pub fn new(key: &str, label: &str) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            numeric: false,
        }
    }

    /// Create a right-aligned numeric column.
    #[must_use]
    pub fn numeric(key: &str, label: &str) -> Self {
        Self {
            numeric: true,
            ..Self::new(key, label)
        }
    }
}

/// Filter type for data tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterType {
    /// Text input filter.
    Text,
    /// Single-select dropdown.
    Select,
    /// Single date input.
    Date,
}

/// Option for select filters.
#[derive(Debug, Clone)]
pub struct FilterOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

impl FilterOption {
    #[must_use]
    pub fn new(value: &str, label: &str, selected: bool) -> Self {
        Self {
            value: value.to_string(),
            label: label.to_string(),
            selected,
        }
    }
}

/// Filter definition for a data table.
#[derive(Debug, Clone)]
pub struct TableFilter {
    /// Query parameter key.
    pub key: String,
    pub label: String,
    pub filter_type: FilterType,
    pub placeholder: String,
    /// Current value for text and date inputs.
    pub value: String,
    /// Available options for selects, with the current one marked.
    pub options: Vec<FilterOption>,
}

impl TableFilter {
    /// Create a text filter.
    #[must_use]
    pub fn text(key: &str, label: &str, placeholder: &str, value: Option<&str>) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            filter_type: FilterType::Text,
            placeholder: placeholder.to_string(),
            value: value.unwrap_or_default().to_string(),
            options: vec![],
        }
    }

    /// Create a select filter. An "All" option is always first.
    #[must_use]
    pub fn select(key: &str, label: &str, options: Vec<FilterOption>) -> Self {
        let none_selected = !options.iter().any(|o| o.selected);
        let mut all = vec![FilterOption::new("", "All", none_selected)];
        all.extend(options);
        Self {
            key: key.to_string(),
            label: label.to_string(),
            filter_type: FilterType::Select,
            placeholder: String::new(),
            value: String::new(),
            options: all,
        }
    }

    /// Create a date filter.
    #[must_use]
    pub fn date(key: &str, label: &str, value: Option<String>) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            filter_type: FilterType::Date,
            placeholder: String::new(),
            value: value.unwrap_or_default(),
            options: vec![],
        }
    }

    #[must_use]
    pub fn is_text(&self) -> bool {
        self.filter_type == FilterType::Text
    }

    #[must_use]
    pub fn is_select(&self) -> bool {
        self.filter_type == FilterType::Select
    }

    #[must_use]
    pub fn is_date(&self) -> bool {
        self.filter_type == FilterType::Date
    }
}

/// Configuration for a data table.
#[derive(Debug, Clone)]
pub struct DataTableConfig {
    /// Unique table identifier.
    pub table_id: String,
    pub columns: Vec<TableColumn>,
    pub filters: Vec<TableFilter>,
    /// Title for empty state.
    pub empty_title: String,
    /// Description for empty state.
    pub empty_description: Option<String>,
    /// Whether to show the filter bar.
    pub has_filters: bool,
    /// Whether any filter currently narrows the rows.
    pub filtered: bool,
}

impl DataTableConfig {
    #[must_use]
    pub fn new(table_id: &str) -> Self {
        Self {
            table_id: table_id.to_string(),
            columns: vec![],
            filters: vec![],
            empty_title: "No items found".to_string(),
            empty_description: None,
            has_filters: false,
            filtered: false,
        }
    }

    /// Add a column.
    #[must_use]
    pub fn column(mut self, column: TableColumn) -> Self {
        self.columns.push(column);
        self
    }

    /// Add a filter.
    #[must_use]
    pub fn filter(mut self, filter: TableFilter) -> Self {
        self.has_filters = true;
        self.filters.push(filter);
        self
    }

    /// Set empty state configuration.
    #[must_use]
    pub fn empty_state(mut self, title: &str, description: Option<&str>) -> Self {
        self.empty_title = title.to_string();
        self.empty_description = description.map(ToString::to_string);
        self
    }

    #[must_use]
    pub const fn filtered(mut self, filtered: bool) -> Self {
        self.filtered = filtered;
        self
    }
}

/// Build the orders table configuration for the current filter.
#[must_use]
pub fn orders_table_config(filter: &OrderFilter) -> DataTableConfig {
    let mut config = DataTableConfig::new("orders")
        .column(TableColumn::new("order", "Order"))
        .column(TableColumn::new("date", "Date"))
        .column(TableColumn::new("customer", "Customer"))
        .column(TableColumn::numeric("items", "Items"))
        .column(TableColumn::numeric("total", "Total"))
        .column(TableColumn::new("payment", "Payment"))
        .column(TableColumn::new("shipping", "Shipping"))
        .filter(TableFilter::text(
            "q",
            "Search",
            "Order id, customer name or email",
            filter.q.as_deref(),
        ))
        .filter(TableFilter::select(
            "shipping_status",
            "Shipping",
            ShippingStatus::ALL
                .iter()
                .map(|s| FilterOption::new(s.as_str(), s.label(), filter.shipping_status == Some(*s)))
                .collect(),
        ))
        .filter(TableFilter::select(
            "payment_status",
            "Payment",
            PaymentStatus::ALL
                .iter()
                .map(|s| FilterOption::new(s.as_str(), s.label(), filter.payment_status == Some(*s)))
                .collect(),
        ))
        .filter(TableFilter::date(
            "from",
            "From",
            filter.from.map(|d| d.to_string()),
        ))
        .filter(TableFilter::date("to", "To", filter.to.map(|d| d.to_string())))
        .filtered(filter.is_active());

    config = if filter.is_active() {
        config.empty_state(
            "No orders match these filters",
            Some("Try adjusting your search or filters"),
        )
    } else {
        config.empty_state("No orders yet", None)
    };
    config
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn test_unfiltered_config() {
        let config = orders_table_config(&OrderFilter::default());
        assert_eq!(config.columns.len(), 7);
        assert!(config.has_filters);
        assert!(!config.filtered);
        assert_eq!(config.empty_title, "No orders yet");

        let shipping = &config.filters[1];
        assert!(shipping.is_select());
        assert_eq!(shipping.options.len(), ShippingStatus::ALL.len() + 1);
        assert!(shipping.options[0].selected);
    }

    #[test]
    fn test_filter_values_carry_through() {
        let filter = OrderFilter {
            q: Some("ada".to_string()),
            shipping_status: Some(ShippingStatus::Shipped),
            from: NaiveDate::from_ymd_opt(2026, 3, 1),
            ..OrderFilter::default()
        };
        let config = orders_table_config(&filter);
        assert!(config.filtered);
        assert_eq!(config.filters[0].value, "ada");

        let selected: Vec<_> = config.filters[1]
            .options
            .iter()
            .filter(|o| o.selected)
            .map(|o| o.value.as_str())
            .collect();
        assert_eq!(selected, vec!["shipped"]);
        assert!(config.filters[2].options[0].selected);
        assert_eq!(config.filters[3].value, "2026-03-01");
        assert!(config.filters[4].value.is_empty());
        assert_eq!(config.empty_title, "No orders match these filters");
    }
}
