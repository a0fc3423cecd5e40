//! Stable id indexing.
//!
//! Maps schematic-local component ids (e.g. "V12") to contiguous arena
//! indices and back, and proposes nearest matches for unknown ids.

use std::collections::HashMap;

use hf_core::CompIdx;

/// Bidirectional id ↔ index lookup for one schematic snapshot.
#[derive(Debug, Clone, Default)]
pub struct IdIndex {
    /// Contiguous list of ids (index -> id).
    ids: Vec<String>,
    /// Reverse lookup: id -> index.
    by_id: HashMap<String, CompIdx>,
}

impl IdIndex {
    /// Build from ids already checked for duplicates and range.
    pub(crate) fn from_ids<'a>(ids: impl Iterator<Item = &'a str>) -> Self {
        let mut index = IdIndex::default();
        for (i, id) in ids.enumerate() {
            if let Some(idx) = CompIdx::from_usize(i) {
                index.ids.push(id.to_string());
                index.by_id.insert(id.to_string(), idx);
            }
        }
        index
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Get the arena index for an id.
    pub fn get(&self, id: &str) -> Option<CompIdx> {
        self.by_id.get(id).copied()
    }

    /// Get the id for an arena index.
    pub fn id(&self, idx: CompIdx) -> Option<&str> {
        self.ids.get(idx.slot()).map(String::as_str)
    }

    /// Iterate over all ids in index order.
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// Ids closest to `query`, best first, at most `limit`.
    pub fn suggest(&self, query: &str, limit: usize) -> Vec<String> {
        suggest(self.ids.iter().map(String::as_str), query, limit)
    }
}

/// Candidates closest to `query`, best first, at most `limit`.
///
/// Candidates are ranked by case-insensitive edit distance; a
/// case-insensitive prefix match counts as distance 1. Candidates further
/// than half the query length (minimum 2) are dropped.
pub fn suggest<'a>(
    candidates: impl IntoIterator<Item = &'a str>,
    query: &str,
    limit: usize,
) -> Vec<String> {
    let needle = query.to_ascii_lowercase();
    let cutoff = (needle.chars().count() / 2).max(2);

    let mut scored: Vec<(usize, &str)> = candidates
        .into_iter()
        .filter_map(|id| {
            let hay = id.to_ascii_lowercase();
            let dist = if hay == needle {
                0
            } else if !needle.is_empty() && (hay.starts_with(&needle) || needle.starts_with(&hay))
            {
                1
            } else {
                levenshtein(&needle, &hay)
            };
            (dist <= cutoff).then_some((dist, id))
        })
        .collect();

    scored.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1)));
    scored
        .into_iter()
        .take(limit)
        .map(|(_, id)| id.to_string())
        .collect()
}

/// Simple Levenshtein distance.
fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut cur = vec![0usize; b.len() + 1];
    for i in 1..=a.len() {
        cur[0] = i;
        for j in 1..=b.len() {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            cur[j] = (prev[j] + 1).min(cur[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(ids: &[&str]) -> IdIndex {
        IdIndex::from_ids(ids.iter().copied())
    }

    #[test]
    fn index_round_trip() {
        let idx = index(&["P1", "V12", "H203"]);
        assert_eq!(idx.len(), 3);
        let v12 = idx.get("V12").unwrap();
        assert_eq!(v12.index(), 1);
        assert_eq!(idx.id(v12), Some("V12"));
        assert!(idx.get("v12").is_none());
    }

    #[test]
    fn levenshtein_basics() {
        assert_eq!(levenshtein("", ""), 0);
        assert_eq!(levenshtein("abc", ""), 3);
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("v12", "v21"), 2);
    }

    #[test]
    fn suggestions_rank_closest_first() {
        let idx = index(&["V12", "V13", "V2", "H203", "PUMP_MAIN"]);
        let s = idx.suggest("v12", 3);
        assert_eq!(s.first().map(String::as_str), Some("V12"));
        assert!(s.contains(&"V13".to_string()));
        assert!(!s.contains(&"PUMP_MAIN".to_string()));

        let s = idx.suggest("PUMP", 3);
        assert_eq!(s, vec!["PUMP_MAIN".to_string()]);
    }

    #[test]
    fn suggestions_empty_when_nothing_close() {
        let idx = index(&["V12", "H203"]);
        assert!(idx.suggest("ACCUMULATOR", 3).is_empty());
    }
}
