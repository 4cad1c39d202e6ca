use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use crate::config::{RunConfig, DEFAULT_CONCURRENCY, DEFAULT_PAGES_PER_QUERY, DEFAULT_RESULTS_PER_PAGE};
use crate::filter::{parse_csv_list, DEFAULT_EXCLUDES, DEFAULT_INCLUDES};
use crate::search_engine::DEFAULT_ENDPOINT;

/// Find guest-post and contributor pages for a niche and collect contact signals.
#[derive(Parser, Debug)]
#[command(name = "prospect-finder", version, about)]
pub struct Cli {
    /// Topic to search for, e.g. "digital marketing"
    #[arg(short, long)]
    pub niche: String,

    /// SerpAPI key. Used for this run only, never logged.
    #[arg(long, env = "SERPAPI_KEY", hide_env_values = true)]
    pub api_key: String,

    /// Results per search page (10-100)
    #[arg(long, default_value_t = DEFAULT_RESULTS_PER_PAGE)]
    pub results_per_page: usize,

    /// Pages fetched per query (1-5)
    #[arg(long, default_value_t = DEFAULT_PAGES_PER_QUERY)]
    pub pages: usize,

    /// Seconds to wait after every request (0-5)
    #[arg(long, default_value_t = 1.0)]
    pub delay: f64,

    /// Comma separated domain substrings to exclude
    #[arg(long, default_value = DEFAULT_EXCLUDES)]
    pub exclude: String,

    /// Comma separated terms; a result must mention one. Empty to disable.
    #[arg(long, default_value = DEFAULT_INCLUDES)]
    pub include: String,

    /// Allow any TLD instead of only .com and .org
    #[arg(long)]
    pub any_tld: bool,

    /// Maximum results kept per domain (1-10)
    #[arg(long, default_value_t = 1)]
    pub max_per_domain: usize,

    /// Parallel page visits (1-16)
    #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
    pub concurrency: usize,

    /// Include title and snippet columns in the printed table
    #[arg(long)]
    pub show_snippets: bool,

    /// CSV export path
    #[arg(short, long, default_value = "prospects.csv")]
    pub output: PathBuf,

    /// Search API endpoint
    #[arg(long, default_value = DEFAULT_ENDPOINT)]
    pub search_endpoint: String,
}

impl Cli {
    /// Builds the run configuration. Range checks are left to `RunConfig::validate`.
    pub fn to_run_config(&self) -> RunConfig {
        let mut cfg = RunConfig::new(self.niche.clone(), self.api_key.clone());
        cfg.results_per_page = self.results_per_page;
        cfg.pages_per_query = self.pages;
        // Negative or NaN delays become Duration::MAX so validate() rejects them.
        cfg.delay = Duration::try_from_secs_f64(self.delay).unwrap_or(Duration::MAX);
        cfg.filter.excluded_domains = parse_csv_list(&self.exclude).into_iter().collect();
        cfg.filter.allowed_tlds_only = !self.any_tld;
        cfg.filter.include_terms = parse_csv_list(&self.include);
        cfg.filter.max_per_domain = self.max_per_domain;
        cfg.concurrency = self.concurrency;
        cfg
    }
}
