/// Quoted-phrase prefixes, one search query each.
pub const QUERY_TEMPLATES: [&str; 5] = [
    "write for us",
    "guest post",
    "contribute",
    "submit an article",
    "editorial guidelines",
];

/// Expands a niche into the fixed query set. Blank niches are rejected by `RunConfig`.
pub fn build_queries(niche: &str) -> Vec<String> {
    let niche = niche.trim();
    QUERY_TEMPLATES
        .iter()
        .map(|phrase| format!("\"{}\" {}", phrase, niche))
        .collect()
}
