use std::collections::{BTreeSet, HashMap};
use log::debug;
use url::{Host, Url};
use crate::search_engine::SearchResult;

pub const DEFAULT_EXCLUDES: &str = "facebook.com,pinterest.com,linkedin.com,instagram.com,twitter.com,\
t.co,youtube.com,medium.com,reddit.com,quora.com";
pub const DEFAULT_INCLUDES: &str = "guest post,write for us,submit an article,contribute";

const ALLOWED_TLDS: [&str; 2] = [".com", ".org"];

#[derive(Debug, Clone, PartialEq)]
pub struct FilterConfig {
    /// Substrings matched against the registrable domain.
    pub excluded_domains: BTreeSet<String>,
    pub allowed_tlds_only: bool,
    /// Lowercased; matched case-insensitively against title, url and snippet.
    pub include_terms: Vec<String>,
    pub max_per_domain: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        FilterConfig {
            excluded_domains: parse_csv_list(DEFAULT_EXCLUDES).into_iter().collect(),
            allowed_tlds_only: true,
            include_terms: parse_csv_list(DEFAULT_INCLUDES),
            max_per_domain: 1,
        }
    }
}

/// Comma separated, trimmed, lowercased, blanks removed.
pub fn parse_csv_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Last two labels of the URL host, lowercased. Bare hosts are accepted so the
/// function can be applied to its own output. Returns "" when there is no host.
pub fn extract_domain(url: &str) -> String {
    let parsed = match Url::parse(url) {
        Ok(u) => u,
        Err(url::ParseError::RelativeUrlWithoutBase) => match Url::parse(&format!("http://{}", url)) {
            Ok(u) => u,
            Err(_) => return String::new(),
        },
        Err(_) => return String::new(),
    };

    match parsed.host() {
        Some(Host::Domain(host)) => {
            let host = host.trim_end_matches('.').to_lowercase();
            let labels: Vec<&str> = host.split('.').collect();
            if labels.len() >= 2 {
                labels[labels.len() - 2..].join(".")
            } else {
                host
            }
        }
        Some(Host::Ipv4(ip)) => ip.to_string(),
        // Bracketed so the result parses back as a host.
        Some(Host::Ipv6(ip)) => format!("[{}]", ip),
        None => String::new(),
    }
}

/// Running per-domain pass counts for one run.
#[derive(Debug, Default)]
pub struct DomainQuota {
    counts: HashMap<String, usize>,
    limit: usize,
}

impl DomainQuota {
    pub fn new(limit: usize) -> Self {
        DomainQuota { counts: HashMap::new(), limit }
    }

    /// Takes a slot for `domain` if one is left.
    pub fn try_take(&mut self, domain: &str) -> bool {
        let count = self.counts.entry(domain.to_string()).or_insert(0);
        if *count < self.limit {
            *count += 1;
            true
        } else {
            false
        }
    }

    pub fn count(&self, domain: &str) -> usize {
        self.counts.get(domain).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    NoDomain,
    Excluded,
    Tld,
    NoIncludeTerm,
    QuotaFull,
}

/// Filters candidates in a fixed order: domain, exclusion, TLD, include terms, quota.
/// The quota is stateful, so the first N records of a domain are the ones kept.
pub struct FilterChain<'a> {
    cfg: &'a FilterConfig,
    quota: DomainQuota,
}

impl<'a> FilterChain<'a> {
    pub fn new(cfg: &'a FilterConfig) -> Self {
        FilterChain { cfg, quota: DomainQuota::new(cfg.max_per_domain) }
    }

    pub fn filter(&mut self, results: Vec<SearchResult>) -> Vec<SearchResult> {
        let mut kept = Vec::with_capacity(results.len());
        for r in results {
            match self.check(&r) {
                Ok(()) => kept.push(r),
                Err(reason) => debug!("Dropped {} ({:?})", r.url, reason),
            }
        }
        kept
    }

    /// Runs one record through the chain, consuming a quota slot if it passes.
    pub fn check(&mut self, r: &SearchResult) -> Result<(), Rejection> {
        let domain = extract_domain(&r.url);
        if domain.is_empty() {
            return Err(Rejection::NoDomain);
        }
        if self.cfg.excluded_domains.iter().any(|ex| domain.contains(ex.as_str())) {
            return Err(Rejection::Excluded);
        }
        if self.cfg.allowed_tlds_only && !ALLOWED_TLDS.iter().any(|tld| domain.ends_with(tld)) {
            return Err(Rejection::Tld);
        }
        if !matches_include_terms(r, &self.cfg.include_terms) {
            return Err(Rejection::NoIncludeTerm);
        }
        if !self.quota.try_take(&domain) {
            return Err(Rejection::QuotaFull);
        }
        Ok(())
    }

    pub fn quota(&self) -> &DomainQuota {
        &self.quota
    }
}

fn matches_include_terms(r: &SearchResult, terms: &[String]) -> bool {
    if terms.is_empty() {
        return true;
    }
    let hay = format!("{} {} {}", r.title, r.url, r.snippet).to_lowercase();
    terms.iter().any(|term| hay.contains(&term.to_lowercase()))
}
