//! Insertion-ordered object storage for [`RdnValue`].
//!
//! Objects keep their properties in document order so that a parsed value
//! writes back in the order it was read.
//!
//! ```rust
//! use rdn::{RdnMap, RdnValue};
//!
//! let mut map = RdnMap::new();
//! map.insert("b".to_string(), RdnValue::from(1));
//! map.insert("a".to_string(), RdnValue::from(2));
//!
//! let keys: Vec<_> = map.keys().cloned().collect();
//! assert_eq!(keys, ["b", "a"]);
//! ```

use crate::RdnValue;
use indexmap::IndexMap;

/// Object properties in insertion order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RdnMap(IndexMap<String, RdnValue>);

impl RdnMap {
    #[must_use]
    pub fn new() -> Self {
        RdnMap(IndexMap::new())
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        RdnMap(IndexMap::with_capacity(capacity))
    }

    /// Inserts a property. A repeated name keeps its first position and
    /// takes the new value, which is returned in place of the old one.
    pub fn insert(&mut self, key: String, value: RdnValue) -> Option<RdnValue> {
        self.0.insert(key, value)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&RdnValue> {
        self.0.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<RdnValue> {
        self.0.shift_remove(key)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> indexmap::map::Keys<'_, String, RdnValue> {
        self.0.keys()
    }

    pub fn values(&self) -> indexmap::map::Values<'_, String, RdnValue> {
        self.0.values()
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, RdnValue> {
        self.0.iter()
    }
}

impl IntoIterator for RdnMap {
    type Item = (String, RdnValue);
    type IntoIter = indexmap::map::IntoIter<String, RdnValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a RdnMap {
    type Item = (&'a String, &'a RdnValue);
    type IntoIter = indexmap::map::Iter<'a, String, RdnValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<(String, RdnValue)> for RdnMap {
    fn from_iter<T: IntoIterator<Item = (String, RdnValue)>>(iter: T) -> Self {
        RdnMap(IndexMap::from_iter(iter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_key_keeps_position() {
        let mut map: RdnMap = [("x", 1), ("y", 2)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), RdnValue::from(v)))
            .collect();
        assert_eq!(map.insert("x".to_string(), RdnValue::from(3)), Some(RdnValue::from(1)));
        let entries: Vec<_> = map.iter().map(|(k, v)| (k.as_str(), v.as_i64())).collect();
        assert_eq!(entries, [("x", Some(3)), ("y", Some(2))]);
        assert_eq!(map.remove("x"), Some(RdnValue::from(3)));
        assert!(!map.contains_key("x"));
    }
}
