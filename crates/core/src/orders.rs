//! Order table filtering for the admin dashboard.
//!
//! The admin orders page fetches every order in one call and narrows the list
//! locally, so filters only ever see the snapshot that was just fetched.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};

use crate::models::Order;
use crate::types::{PaymentStatus, ShippingStatus};

/// Filters for the orders table, bound from the query string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OrderFilter {
    /// Matches order id, customer name or customer email.
    #[serde(deserialize_with = "blank_as_none")]
    pub q: Option<String>,
    #[serde(deserialize_with = "blank_as_none")]
    pub shipping_status: Option<ShippingStatus>,
    #[serde(deserialize_with = "blank_as_none")]
    pub payment_status: Option<PaymentStatus>,
    /// Inclusive lower bound on the order date (UTC).
    #[serde(deserialize_with = "blank_as_none")]
    pub from: Option<NaiveDate>,
    /// Inclusive upper bound on the order date (UTC).
    #[serde(deserialize_with = "blank_as_none")]
    pub to: Option<NaiveDate>,
}

fn blank_as_none<'de, D, T>(de: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: std::str::FromStr,
{
    let raw = Option::<String>::deserialize(de)?;
    Ok(raw
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse().ok()))
}

impl OrderFilter {
    #[must_use]
    pub fn is_active(&self) -> bool {
        self != &Self::default()
    }

    /// Whether a single order passes every set filter.
    #[must_use]
    pub fn matches(&self, order: &Order) -> bool {
        if let Some(q) = self.q.as_deref() {
            let needle = q.to_lowercase();
            let customer = order.user.as_ref();
            let hit = order.id.as_str().to_lowercase().contains(&needle)
                || customer.is_some_and(|u| {
                    u.name.to_lowercase().contains(&needle)
                        || u.email.to_lowercase().contains(&needle)
                })
                || order.shipping_address.full_name.to_lowercase().contains(&needle);
            if !hit {
                return false;
            }
        }

        if self
            .shipping_status
            .is_some_and(|s| s != order.shipping_status)
        {
            return false;
        }
        if self
            .payment_status
            .is_some_and(|s| s != order.payment_status)
        {
            return false;
        }

        if self.from.is_some() || self.to.is_some() {
            let Some(placed) = order.created_at.map(|at| at.date_naive()) else {
                return false;
            };
            if self.from.is_some_and(|from| placed < from) || self.to.is_some_and(|to| placed > to)
            {
                return false;
            }
        }

        true
    }

    /// Serialize back to a query string, omitting unset filters.
    #[must_use]
    pub fn to_query_string(&self) -> String {
        let mut ser = url::form_urlencoded::Serializer::new(String::new());
        if let Some(q) = self.q.as_deref() {
            ser.append_pair("q", q);
        }
        if let Some(status) = self.shipping_status {
            ser.append_pair("shipping_status", status.as_str());
        }
        if let Some(status) = self.payment_status {
            ser.append_pair("payment_status", status.as_str());
        }
        if let Some(from) = self.from {
            ser.append_pair("from", &from.to_string());
        }
        if let Some(to) = self.to {
            ser.append_pair("to", &to.to_string());
        }
        ser.finish()
    }
}

/// Keep the orders that match, in their incoming order.
#[must_use]
pub fn filter_orders<'a>(orders: &'a [Order], filter: &OrderFilter) -> Vec<&'a Order> {
    orders.iter().filter(|o| filter.matches(o)).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn orders() -> Vec<Order> {
        serde_json::from_value(json!([
            { "_id": "ord-300", "user": { "_id": "u1", "name": "Ada Lovelace", "email": "ada@example.com" },
              "paymentStatus": "paid", "shippingStatus": "shipped",
              "createdAt": "2024-05-03T09:00:00Z", "total": 40 },
            { "_id": "ord-200", "user": { "_id": "u2", "name": "Grace Hopper", "email": "grace@navy.mil" },
              "paymentStatus": "pending", "shippingStatus": "pending",
              "createdAt": "2024-05-02T23:59:00Z", "total": 15 },
            { "_id": "ord-100", "shippingAddress": { "fullName": "Alan Turing" },
              "paymentStatus": "refunded", "shippingStatus": "returned",
              "createdAt": "2024-04-30T12:00:00Z", "total": 8 }
        ]))
        .unwrap()
    }

    fn filter(pairs: &[(&str, &str)]) -> OrderFilter {
        let map: serde_json::Map<String, serde_json::Value> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), json!(v)))
            .collect();
        serde_json::from_value(serde_json::Value::Object(map)).unwrap()
    }

    fn ids(orders: &[&Order]) -> Vec<String> {
        orders.iter().map(|o| o.id.to_string()).collect()
    }

    #[test]
    fn test_no_filter_keeps_incoming_order() {
        let all = orders();
        let kept = filter_orders(&all, &OrderFilter::default());
        assert_eq!(ids(&kept), vec!["ord-300", "ord-200", "ord-100"]);
        assert!(!OrderFilter::default().is_active());
    }

    #[test]
    fn test_search_matches_id_name_email() {
        let all = orders();
        assert_eq!(ids(&filter_orders(&all, &filter(&[("q", "ORD-2")]))), vec!["ord-200"]);
        assert_eq!(ids(&filter_orders(&all, &filter(&[("q", "lovelace")]))), vec!["ord-300"]);
        assert_eq!(ids(&filter_orders(&all, &filter(&[("q", "navy.mil")]))), vec!["ord-200"]);
        assert_eq!(ids(&filter_orders(&all, &filter(&[("q", "turing")]))), vec!["ord-100"]);
    }

    #[test]
    fn test_status_filters() {
        let all = orders();
        let f = filter(&[("shipping_status", "returned")]);
        assert_eq!(ids(&filter_orders(&all, &f)), vec!["ord-100"]);
        let f = filter(&[("payment_status", "Paid")]);
        assert_eq!(ids(&filter_orders(&all, &f)), vec!["ord-300"]);
    }

    #[test]
    fn test_date_range_is_inclusive() {
        let all = orders();
        let f = filter(&[("from", "2024-05-02"), ("to", "2024-05-02")]);
        assert_eq!(ids(&filter_orders(&all, &f)), vec!["ord-200"]);
        let f = filter(&[("from", "2024-05-01")]);
        assert_eq!(ids(&filter_orders(&all, &f)), vec!["ord-300", "ord-200"]);
    }

    #[test]
    fn test_blank_and_malformed_values_are_ignored() {
        let f = filter(&[("q", ""), ("shipping_status", "lost"), ("from", "yesterday")]);
        assert_eq!(f, OrderFilter::default());
    }

    #[test]
    fn test_query_string_round_trip() {
        let f = filter(&[("q", "ada"), ("payment_status", "paid"), ("to", "2024-05-31")]);
        assert_eq!(f.to_query_string(), "q=ada&payment_status=paid&to=2024-05-31");
    }
}
