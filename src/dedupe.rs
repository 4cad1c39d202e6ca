use std::collections::HashSet;
use crate::search_engine::SearchResult;

/// Unique by exact URL string, first occurrence wins. Empty URLs are dropped.
pub fn dedupe(results: Vec<SearchResult>) -> Vec<SearchResult> {
    let mut seen = HashSet::with_capacity(results.len());
    results
        .into_iter()
        .filter(|r| !r.url.is_empty() && seen.insert(r.url.clone()))
        .collect()
}
