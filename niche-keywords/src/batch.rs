//! Request batching under provider limits
//!
//! The trends endpoint accepts at most [`TRENDS_BATCH_LIMIT`] keywords per
//! call. Callers deduplicate first, partition, issue one request per chunk in
//! order and fold the per-chunk answers into a single [`KeywordMap`].

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::HashMap;
use tracing::warn;

/// Maximum keywords per trends request
pub const TRENDS_BATCH_LIMIT: usize = 5;

/// Split `items` into consecutive chunks of at most `size` elements
///
/// `size` is clamped to `1..=TRENDS_BATCH_LIMIT`. Every element lands in
/// exactly one chunk and order is preserved.
pub fn partition<T: Clone>(items: &[T], size: usize) -> Vec<Vec<T>> {
    let size = size.clamp(1, TRENDS_BATCH_LIMIT);
    items.chunks(size).map(|chunk| chunk.to_vec()).collect()
}

/// Trim keywords, drop empty ones and keep the first occurrence of each
pub fn dedupe_keywords<S: AsRef<str>>(keywords: &[S]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    keywords
        .iter()
        .map(|k| k.as_ref().trim())
        .filter(|k| !k.is_empty())
        .filter(|k| seen.insert(k.to_string()))
        .map(str::to_string)
        .collect()
}

/// Fold per-chunk results into one map in chunk order
pub fn merge_batches<V>(batches: impl IntoIterator<Item = KeywordMap<V>>) -> KeywordMap<V> {
    let mut merged = KeywordMap::new();
    for batch in batches {
        merged.merge(batch);
    }
    merged
}

/// Insertion-ordered map keyed by keyword text
///
/// Serializes as a JSON object in insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordMap<V> {
    entries: Vec<(String, V)>,
    index: HashMap<String, usize>,
}

impl<V> Default for KeywordMap<V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<V> KeywordMap<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace; returns true when an existing entry was replaced
    ///
    /// A replaced entry keeps its original position.
    pub fn insert(&mut self, keyword: impl Into<String>, value: V) -> bool {
        let keyword = keyword.into();
        match self.index.get(&keyword) {
            Some(&pos) => {
                self.entries[pos].1 = value;
                true
            }
            None => {
                self.index.insert(keyword.clone(), self.entries.len());
                self.entries.push((keyword, value));
                false
            }
        }
    }

    pub fn get(&self, keyword: &str) -> Option<&V> {
        self.index.get(keyword).map(|&pos| &self.entries[pos].1)
    }

    pub fn contains(&self, keyword: &str) -> bool {
        self.index.contains_key(keyword)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Fold another batch in; duplicates are overwritten by the later batch
    pub fn merge(&mut self, batch: KeywordMap<V>) {
        for (keyword, value) in batch.entries {
            if self.insert(keyword.clone(), value) {
                warn!(keyword = %keyword, "Keyword appeared in more than one batch, keeping the later result");
            }
        }
    }

    /// Keep the first `n` entries
    pub fn truncated(mut self, n: usize) -> Self {
        for (keyword, _) in self.entries.drain(n.min(self.entries.len())..) {
            self.index.remove(&keyword);
        }
        self
    }
}

impl<V> FromIterator<(String, V)> for KeywordMap<V> {
    fn from_iter<I: IntoIterator<Item = (String, V)>>(iter: I) -> Self {
        let mut map = KeywordMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl<V> IntoIterator for KeywordMap<V> {
    type Item = (String, V);
    type IntoIter = std::vec::IntoIter<(String, V)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<V: Serialize> Serialize for KeywordMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keywords(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("kw{}", i)).collect()
    }

    #[test]
    fn test_twelve_keywords_make_three_batches() {
        let input = keywords(12);
        let batches = partition(&input, TRENDS_BATCH_LIMIT);

        let sizes: Vec<_> = batches.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![5, 5, 2]);

        let flattened: Vec<_> = batches.into_iter().flatten().collect();
        assert_eq!(flattened, input);
    }

    #[test]
    fn test_partition_clamps_size() {
        let input = keywords(7);
        assert_eq!(partition(&input, 50).len(), 2);
        assert_eq!(partition(&input, 0).len(), 7);
        assert!(partition::<String>(&[], 5).is_empty());
    }

    #[test]
    fn test_dedupe_keeps_first_occurrence() {
        let deduped = dedupe_keywords(&[" desk mat", "desk mat", "", "monitor arm ", "desk mat "]);
        assert_eq!(deduped, vec!["desk mat", "monitor arm"]);
    }

    #[test]
    fn test_merge_preserves_order_and_overwrites_duplicates() {
        let mut merged: KeywordMap<u32> =
            vec![("a".to_string(), 1), ("b".to_string(), 2)].into_iter().collect();
        let later: KeywordMap<u32> =
            vec![("c".to_string(), 3), ("a".to_string(), 10)].into_iter().collect();
        merged.merge(later);

        assert_eq!(merged.keys().collect::<Vec<_>>(), vec!["a", "b", "c"]);
        assert_eq!(merged.get("a"), Some(&10));
        assert_eq!(merged.len(), 3);
    }

    #[test]
    fn test_merge_batches_keeps_first_seen_order() {
        let first: KeywordMap<u32> =
            vec![("desk mat".to_string(), 1), ("footrest".to_string(), 2)].into_iter().collect();
        let second: KeywordMap<u32> =
            vec![("monitor arm".to_string(), 3), ("desk mat".to_string(), 4)].into_iter().collect();

        let merged = merge_batches(vec![first, second]);
        assert_eq!(
            merged.keys().collect::<Vec<_>>(),
            vec!["desk mat", "footrest", "monitor arm"]
        );
        assert_eq!(merged.get("desk mat"), Some(&4));
        assert!(merge_batches(Vec::<KeywordMap<u32>>::new()).is_empty());
    }

    #[test]
    fn test_serializes_in_insertion_order() {
        let map: KeywordMap<u32> = vec![("zeta".to_string(), 1), ("alpha".to_string(), 2)]
            .into_iter()
            .collect();
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"zeta":1,"alpha":2}"#);
    }

    #[test]
    fn test_truncated_drops_tail_from_index() {
        let map: KeywordMap<u32> = vec![
            ("a".to_string(), 1),
            ("b".to_string(), 2),
            ("c".to_string(), 3),
        ]
        .into_iter()
        .collect();
        let head = map.truncated(2);
        assert_eq!(head.len(), 2);
        assert!(!head.contains("c"));
        assert!(head.contains("b"));
    }
}
