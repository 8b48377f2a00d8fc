// src/inventory.rs

use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Insertion-ordered `identifier -> quantity` table.
///
/// Iteration order is the order identifiers were first seen in the source
/// document. The allocator relies on this for its stable tie-break.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuantityTable {
    entries: Vec<(String, u32)>,
    index: HashMap<String, usize>,
}

/// Godown stock: article -> units available.
pub type ArticleStock = QuantityTable;

/// Store intake limits: store -> maximum receivable units.
pub type StoreCapacity = QuantityTable;

impl QuantityTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite. A repeated key keeps its first position.
    pub fn insert(&mut self, key: impl Into<String>, quantity: u32) {
        let key = key.into();
        match self.index.get(&key) {
            Some(&pos) => self.entries[pos].1 = quantity,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, quantity));
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<u32> {
        self.index.get(key).map(|&pos| self.entries[pos].1)
    }

    /// Remove up to `units` from `key`, saturating at zero.
    pub fn take(&mut self, key: &str, units: u32) {
        if let Some(&pos) = self.index.get(key) {
            let qty = &mut self.entries[pos].1;
            *qty = qty.saturating_sub(units);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.entries.iter().map(|(k, q)| (k.as_str(), *q))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all quantities.
    pub fn total_units(&self) -> u64 {
        self.entries.iter().map(|(_, q)| u64::from(*q)).sum()
    }
}

impl<K: Into<String>> FromIterator<(K, u32)> for QuantityTable {
    fn from_iter<I: IntoIterator<Item = (K, u32)>>(iter: I) -> Self {
        let mut table = QuantityTable::new();
        for (k, q) in iter {
            table.insert(k, q);
        }
        table
    }
}

/// Which articles each store has already received in earlier periods.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SupplyHistory {
    sent: BTreeMap<String, BTreeSet<String>>,
    units: BTreeMap<String, u64>,
}

impl SupplyHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, store: impl Into<String>, article: impl Into<String>, quantity: u32) {
        let store = store.into();
        *self.units.entry(store.clone()).or_default() += u64::from(quantity);
        self.sent.entry(store).or_default().insert(article.into());
    }

    /// Articles already sent to `store`, or `None` when the store has no history.
    pub fn sent_to(&self, store: &str) -> Option<&BTreeSet<String>> {
        self.sent.get(store)
    }

    pub fn was_sent(&self, store: &str, article: &str) -> bool {
        self.sent.get(store).is_some_and(|set| set.contains(article))
    }

    /// Units recorded as supplied to `store` (0 for article-list sources).
    pub fn supplied_units(&self, store: &str) -> u64 {
        self.units.get(store).copied().unwrap_or(0)
    }

    pub fn stores(&self) -> impl Iterator<Item = (&str, &BTreeSet<String>)> {
        self.sent.iter().map(|(s, a)| (s.as_str(), a))
    }

    pub fn store_count(&self) -> usize {
        self.sent.len()
    }

    /// Total (store, article) pairs on record.
    pub fn total_sent_articles(&self) -> usize {
        self.sent.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.sent.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reinsert_keeps_position() {
        let mut stock = ArticleStock::new();
        stock.insert("Z2393", 27);
        stock.insert("Z2263", 12);
        stock.insert("Z2393", 3);

        let order: Vec<_> = stock.iter().collect();
        assert_eq!(order, vec![("Z2393", 3), ("Z2263", 12)]);
        assert_eq!(stock.len(), 2);
        assert_eq!(stock.total_units(), 15);
    }

    #[test]
    fn test_take_saturates() {
        let mut stock: ArticleStock = [("A", 2)].into_iter().collect();
        stock.take("A", 5);
        stock.take("missing", 1);
        assert_eq!(stock.get("A"), Some(0));
        assert_eq!(stock.get("missing"), None);
    }

    #[test]
    fn test_history_membership() {
        let mut history = SupplyHistory::new();
        history.record("BOMBAY", "Z2250", 2);
        history.record("BOMBAY", "Z2250", 1);
        history.record("BOMBAY", "Z2252", 1);

        assert!(history.was_sent("BOMBAY", "Z2250"));
        assert!(!history.was_sent("MOGA", "Z2250"));
        assert!(history.sent_to("MOGA").is_none());
        assert_eq!(history.sent_to("BOMBAY").map(BTreeSet::len), Some(2));
        assert_eq!(history.supplied_units("BOMBAY"), 4);
        assert_eq!(history.total_sent_articles(), 2);
    }
}
