//! Catalog filtering and its URL round-trip.
//!
//! The product list page fetches the full catalog once and narrows it here.
//! Every filter lives in the query string so a reload (or a shared link)
//! restores the same view, including the price slider.

use core::fmt;
use std::cmp::Ordering;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};

use crate::models::Product;

/// Catalog sort orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortOrder {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    Name,
    Rating,
}

impl SortOrder {
    pub const ALL: [Self; 5] = [
        Self::Newest,
        Self::PriceAsc,
        Self::PriceDesc,
        Self::Name,
        Self::Rating,
    ];

    /// Query-string value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Newest => "newest",
            Self::PriceAsc => "price_asc",
            Self::PriceDesc => "price_desc",
            Self::Name => "name",
            Self::Rating => "rating",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Newest => "Newest",
            Self::PriceAsc => "Price: low to high",
            Self::PriceDesc => "Price: high to low",
            Self::Name => "Name",
            Self::Rating => "Top rated",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown sort order: {0}")]
pub struct UnknownSortOrder(String);

impl FromStr for SortOrder {
    type Err = UnknownSortOrder;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|o| o.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownSortOrder(s.to_owned()))
    }
}

/// Inclusive price bounds; either side may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PriceRange {
    pub min: Option<Decimal>,
    pub max: Option<Decimal>,
}

impl PriceRange {
    /// Clamp negative bounds to zero and swap inverted ones.
    #[must_use]
    pub fn normalized(self) -> Self {
        let clamp = |d: Decimal| d.max(Decimal::ZERO);
        let min = self.min.map(clamp);
        let max = self.max.map(clamp);
        match (min, max) {
            (Some(lo), Some(hi)) if lo > hi => Self {
                min: Some(hi),
                max: Some(lo),
            },
            _ => Self { min, max },
        }
    }

    #[must_use]
    pub fn contains(&self, price: Decimal) -> bool {
        self.min.is_none_or(|lo| price >= lo) && self.max.is_none_or(|hi| price <= hi)
    }

    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }
}

/// Query parameters of `GET /products`.
///
/// Parsing is lenient: blank or malformed values fall back to their defaults
/// instead of failing the request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ProductQuery {
    #[serde(deserialize_with = "lenient")]
    pub q: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub category: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub min_price: Option<Decimal>,
    #[serde(deserialize_with = "lenient")]
    pub max_price: Option<Decimal>,
    #[serde(deserialize_with = "lenient_or_default")]
    pub sort: SortOrder,
    #[serde(deserialize_with = "lenient_page")]
    pub page: u32,
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self {
            q: None,
            category: None,
            min_price: None,
            max_price: None,
            sort: SortOrder::default(),
            page: 1,
        }
    }
}

fn lenient<'de, D, T>(de: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
{
    let raw = Option::<String>::deserialize(de)?;
    Ok(raw
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse().ok()))
}

fn lenient_or_default<'de, D, T>(de: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr + Default,
{
    lenient(de).map(Option::unwrap_or_default)
}

fn lenient_page<'de, D>(de: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    lenient::<D, u32>(de).map(|p| p.unwrap_or(1).max(1))
}

impl ProductQuery {
    /// The price filter, normalized.
    #[must_use]
    pub fn price_range(&self) -> PriceRange {
        PriceRange {
            min: self.min_price,
            max: self.max_price,
        }
        .normalized()
    }

    /// Serialize back to a query string, omitting defaults.
    ///
    /// Prices are written normalized so the slider shows what was applied.
    #[must_use]
    pub fn to_query_string(&self) -> String {
        let mut ser = url::form_urlencoded::Serializer::new(String::new());
        if let Some(q) = self.q.as_deref().filter(|q| !q.is_empty()) {
            ser.append_pair("q", q);
        }
        if let Some(category) = self.category.as_deref().filter(|c| !c.is_empty()) {
            ser.append_pair("category", category);
        }
        let range = self.price_range();
        if let Some(min) = range.min {
            ser.append_pair("min_price", &min.normalize().to_string());
        }
        if let Some(max) = range.max {
            ser.append_pair("max_price", &max.normalize().to_string());
        }
        if self.sort != SortOrder::default() {
            ser.append_pair("sort", self.sort.as_str());
        }
        if self.page > 1 {
            ser.append_pair("page", &self.page.to_string());
        }
        ser.finish()
    }

    /// `path` with this query appended, or bare `path` when all defaults.
    #[must_use]
    pub fn href(&self, path: &str) -> String {
        let qs = self.to_query_string();
        if qs.is_empty() {
            path.to_owned()
        } else {
            format!("{path}?{qs}")
        }
    }

    /// Same filters on another page.
    #[must_use]
    pub fn with_page(&self, page: u32) -> Self {
        Self {
            page: page.max(1),
            ..self.clone()
        }
    }

    /// Whether any narrowing filter (not sort or page) is set.
    #[must_use]
    pub fn is_filtered(&self) -> bool {
        self.q.as_deref().is_some_and(|q| !q.is_empty())
            || self.category.is_some()
            || !self.price_range().is_open()
    }

    /// Filter and sort `products` according to this query.
    #[must_use]
    pub fn apply(&self, products: &[Product]) -> Vec<Product> {
        let needle = self
            .q
            .as_deref()
            .map(str::to_lowercase)
            .filter(|n| !n.is_empty());
        let range = self.price_range();

        let mut matched: Vec<Product> = products
            .iter()
            .filter(|p| needle.as_deref().is_none_or(|n| matches_search(p, n)))
            .filter(|p| {
                self.category
                    .as_deref()
                    .is_none_or(|c| p.category_id().is_some_and(|id| id.as_str() == c))
            })
            .filter(|p| range.contains(p.effective_price()))
            .cloned()
            .collect();

        sort_products(&mut matched, self.sort);
        matched
    }
}

fn matches_search(product: &Product, needle: &str) -> bool {
    product.name.to_lowercase().contains(needle)
        || product
            .brand
            .as_deref()
            .is_some_and(|b| b.to_lowercase().contains(needle))
        || product.description.to_lowercase().contains(needle)
}

/// Stable sort in place.
pub fn sort_products(products: &mut [Product], order: SortOrder) {
    match order {
        SortOrder::Newest => products.sort_by(|a, b| match (a.created_at, b.created_at) {
            (Some(x), Some(y)) => y.cmp(&x),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }),
        SortOrder::PriceAsc => products.sort_by_key(Product::effective_price),
        SortOrder::PriceDesc => {
            products.sort_by_key(|p| std::cmp::Reverse(p.effective_price()));
        }
        SortOrder::Name => products.sort_by_cached_key(|p| p.name.to_lowercase()),
        SortOrder::Rating => products.sort_by(|a, b| {
            let x = a.average_rating.unwrap_or(0.0);
            let y = b.average_rating.unwrap_or(0.0);
            y.total_cmp(&x)
        }),
    }
}

/// Cheapest and dearest effective price, for the slider's bounds.
#[must_use]
pub fn price_bounds(products: &[Product]) -> Option<(Decimal, Decimal)> {
    let mut prices = products.iter().map(Product::effective_price);
    let first = prices.next()?;
    Some(prices.fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p))))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::dec;
    use serde_json::json;

    use super::*;

    fn catalog() -> Vec<Product> {
        serde_json::from_value(json!([
            { "_id": "1", "name": "Oolong", "price": 12, "category": "tea",
              "createdAt": "2024-01-01T00:00:00Z", "averageRating": 4.5 },
            { "_id": "2", "name": "Espresso Beans", "brand": "Roastery", "price": 20,
              "description": "Dark roast for coffee lovers",
              "discountPrice": 15, "category": "coffee",
              "createdAt": "2024-03-01T00:00:00Z", "averageRating": 3.9 },
            { "_id": "3", "name": "Ceramic Mug", "description": "Holds tea or coffee",
              "price": 8, "category": { "_id": "kitchen", "name": "Kitchen" } },
            { "_id": "4", "name": "matcha whisk", "price": 25, "category": "tea",
              "createdAt": "2024-02-01T00:00:00Z" }
        ]))
        .unwrap()
    }

    fn ids(products: &[Product]) -> Vec<&str> {
        products.iter().map(|p| p.id.as_str()).collect()
    }

    // Query values arrive as strings, the same as from a form-encoded URL.
    fn parse(qs: &str) -> ProductQuery {
        let map: serde_json::Map<String, serde_json::Value> =
            url::form_urlencoded::parse(qs.as_bytes())
                .map(|(k, v)| (k.into_owned(), serde_json::Value::String(v.into_owned())))
                .collect();
        serde_json::from_value(serde_json::Value::Object(map)).unwrap()
    }

    #[test]
    fn test_default_query_is_empty() {
        let query = parse("");
        assert_eq!(query, ProductQuery::default());
        assert_eq!(query.to_query_string(), "");
        assert_eq!(query.href("/products"), "/products");
    }

    #[test]
    fn test_price_range_round_trips_through_query_string() {
        let query = parse("min_price=10&max_price=20.50&sort=price_asc");
        assert_eq!(query.min_price, Some(dec!(10)));
        assert_eq!(query.max_price, Some(dec!(20.50)));

        let qs = query.to_query_string();
        assert_eq!(qs, "min_price=10&max_price=20.5&sort=price_asc");
        assert_eq!(parse(&qs).price_range(), query.price_range());
    }

    #[test]
    fn test_inverted_range_is_swapped_in_url() {
        let query = parse("min_price=50&max_price=5");
        assert_eq!(
            query.price_range(),
            PriceRange {
                min: Some(dec!(5)),
                max: Some(dec!(50))
            }
        );
        assert_eq!(query.to_query_string(), "min_price=5&max_price=50");
    }

    #[test]
    fn test_negative_bound_clamps_to_zero() {
        let range = PriceRange {
            min: Some(dec!(-3)),
            max: None,
        }
        .normalized();
        assert_eq!(range.min, Some(Decimal::ZERO));
    }

    #[test]
    fn test_malformed_values_fall_back() {
        let query = parse("min_price=cheap&max_price=&sort=random&page=0&q=%20%20");
        assert_eq!(query, ProductQuery::default());
    }

    #[test]
    fn test_search_covers_name_brand_description() {
        let products = catalog();
        assert_eq!(ids(&parse("q=OOLONG").apply(&products)), vec!["1"]);
        assert_eq!(ids(&parse("q=roastery").apply(&products)), vec!["2"]);
        assert_eq!(ids(&parse("q=coffee&sort=name").apply(&products)), vec!["3", "2"]);
    }

    #[test]
    fn test_category_filter_accepts_embedded_category() {
        let products = catalog();
        assert_eq!(ids(&parse("category=kitchen").apply(&products)), vec!["3"]);
        assert_eq!(ids(&parse("category=tea").apply(&products)), vec!["4", "1"]);
    }

    #[test]
    fn test_price_filter_uses_effective_price_inclusively() {
        let products = catalog();
        let result = parse("min_price=12&max_price=15&sort=price_asc").apply(&products);
        assert_eq!(ids(&result), vec!["1", "2"]);
    }

    #[test]
    fn test_sort_orders() {
        let products = catalog();
        assert_eq!(ids(&parse("").apply(&products)), vec!["2", "4", "1", "3"]);
        assert_eq!(ids(&parse("sort=price_desc").apply(&products)), vec!["4", "2", "1", "3"]);
        assert_eq!(ids(&parse("sort=name").apply(&products)), vec!["3", "2", "4", "1"]);
        assert_eq!(ids(&parse("sort=rating").apply(&products)), vec!["1", "2", "3", "4"]);
    }

    #[test]
    fn test_with_page_keeps_filters() {
        let query = parse("q=tea&category=tea");
        assert_eq!(query.with_page(3).href("/products"), "/products?q=tea&category=tea&page=3");
        assert!(query.is_filtered());
        assert!(!parse("sort=name&page=2").is_filtered());
    }

    #[test]
    fn test_price_bounds() {
        assert_eq!(price_bounds(&catalog()), Some((dec!(8), dec!(25))));
        assert_eq!(price_bounds(&[]), None);
    }
}
