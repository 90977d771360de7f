// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Tag sets attached to a line protocol key.

use std::collections::hash_map;
use std::collections::HashMap;

/// Unordered mapping from tag name to tag value.
///
/// Insertion order is irrelevant: the encoder always walks the tags in
/// [`sorted_keys`](Self::sorted_keys) order. Empty tag names are not
/// rejected here; callers are expected not to produce them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSet {
    tags: HashMap<String, String>,
}

impl TagSet {
    /// Create an empty tag set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a tag, returning the previous value for that name if any.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.tags.insert(name.into(), value.into())
    }

    /// Look up the value of a tag.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.tags.get(name).map(String::as_str)
    }

    /// Number of tags.
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// True when the set holds no tags.
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Iterate over `(name, value)` pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.tags.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Tag names sorted by byte value, ascending.
    ///
    /// Rebuilt on every call. An empty set yields an empty vector.
    pub fn sorted_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.tags.keys().map(String::as_str).collect();
        // `str` ordering is byte-lexicographic.
        keys.sort_unstable();
        keys
    }
}

impl From<HashMap<String, String>> for TagSet {
    fn from(tags: HashMap<String, String>) -> Self {
        Self { tags }
    }
}

impl<K, V> FromIterator<(K, V)> for TagSet
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl<K, V> Extend<(K, V)> for TagSet
where
    K: Into<String>,
    V: Into<String>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl IntoIterator for TagSet {
    type Item = (String, String);
    type IntoIter = hash_map::IntoIter<String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.tags.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sorted_keys_empty() {
        let tags = TagSet::new();
        assert!(tags.sorted_keys().is_empty());
    }

    #[test]
    fn test_sorted_keys_ascending() {
        let tags: TagSet = [("region", "eu"), ("host", "a"), ("dc", "1")]
            .into_iter()
            .collect();
        assert_eq!(tags.sorted_keys(), vec!["dc", "host", "region"]);
    }

    #[test]
    fn test_sorted_keys_byte_order() {
        // Uppercase sorts before lowercase, '_' (0x5f) between them.
        let tags: TagSet = [("b", "1"), ("_x", "2"), ("B", "3"), ("a", "4")]
            .into_iter()
            .collect();
        assert_eq!(tags.sorted_keys(), vec!["B", "_x", "a", "b"]);
    }

    #[test]
    fn test_sorted_keys_independent_of_insertion_order() {
        let mut forward = TagSet::new();
        let mut backward = TagSet::new();
        let names = ["zeta", "alpha", "mu", "beta", "omega"];

        for name in names {
            forward.insert(name, "v");
        }
        for name in names.iter().rev() {
            backward.insert(*name, "v");
        }

        assert_eq!(forward, backward);
        assert_eq!(forward.sorted_keys(), backward.sorted_keys());
    }

    #[test]
    fn test_sorted_keys_idempotent() {
        let tags: TagSet = (0..50).map(|i| (format!("k{}", i), "v")).collect();

        let first = tags.sorted_keys();
        let second = tags.sorted_keys();
        assert_eq!(first, second);
        assert_eq!(first.len(), 50);

        let mut expected: Vec<String> = tags.iter().map(|(k, _)| k.to_string()).collect();
        expected.sort();
        assert_eq!(first, expected);
    }

    #[test]
    fn test_insert_replaces_value() {
        let mut tags = TagSet::new();
        assert_eq!(tags.insert("host", "a"), None);
        assert_eq!(tags.insert("host", "b"), Some("a".to_string()));
        assert_eq!(tags.get("host"), Some("b"));
        assert_eq!(tags.len(), 1);
    }

    #[test]
    fn test_from_hash_map() {
        let mut map = HashMap::new();
        map.insert("cpu".to_string(), "0".to_string());
        let tags = TagSet::from(map);
        assert_eq!(tags.get("cpu"), Some("0"));
        assert!(!tags.is_empty());
    }
}
