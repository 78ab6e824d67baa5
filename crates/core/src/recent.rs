//! Recently viewed products.

use serde::{Deserialize, Serialize};

use crate::types::ProductId;

/// Default number of products remembered.
pub const DEFAULT_CAPACITY: usize = 8;

/// A bounded most-recently-used list of product ids.
///
/// Viewing a product moves it to the front. Entries never repeat and the
/// oldest falls off once `capacity` is reached. Stored in the session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentlyViewed {
    items: Vec<ProductId>,
}

impl RecentlyViewed {
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Record a view of `id`, keeping at most `capacity` entries.
    pub fn record(&mut self, id: ProductId, capacity: usize) {
        self.items.retain(|existing| existing != &id);
        self.items.insert(0, id);
        self.items.truncate(capacity);
    }

    /// Most recent first.
    #[must_use]
    pub fn ids(&self) -> &[ProductId] {
        &self.items
    }

    /// Entries other than `current`, most recent first.
    pub fn excluding<'a>(&'a self, current: &'a ProductId) -> impl Iterator<Item = &'a ProductId> {
        self.items.iter().filter(move |id| *id != current)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(list: &RecentlyViewed) -> Vec<&str> {
        list.ids().iter().map(ProductId::as_str).collect()
    }

    #[test]
    fn test_record_puts_latest_first() {
        let mut list = RecentlyViewed::new();
        list.record("a".into(), DEFAULT_CAPACITY);
        list.record("b".into(), DEFAULT_CAPACITY);
        assert_eq!(ids(&list), vec!["b", "a"]);
    }

    #[test]
    fn test_revisit_moves_to_front_without_duplicate() {
        let mut list = RecentlyViewed::new();
        for id in ["a", "b", "c", "a"] {
            list.record(id.into(), DEFAULT_CAPACITY);
        }
        assert_eq!(ids(&list), vec!["a", "c", "b"]);
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let mut list = RecentlyViewed::new();
        for id in ["a", "b", "c", "d"] {
            list.record(id.into(), 3);
        }
        assert_eq!(ids(&list), vec!["d", "c", "b"]);
    }

    #[test]
    fn test_excluding_current() {
        let mut list = RecentlyViewed::new();
        list.record("a".into(), 8);
        list.record("b".into(), 8);
        let current = ProductId::new("b");
        let others: Vec<&str> = list.excluding(&current).map(ProductId::as_str).collect();
        assert_eq!(others, vec!["a"]);
    }
}
