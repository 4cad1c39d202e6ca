use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;
use log::{debug, info, warn};
use crate::error::SearchError;

pub const DEFAULT_ENDPOINT: &str = "https://serpapi.com/search.json";
pub const CLIENT_USER_AGENT: &str = "ProspectFinder/0.6";
const SEARCH_TIMEOUT: Duration = Duration::from_secs(25);

/// One organic search hit. Missing provider fields are empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

impl SearchResult {
    pub fn new(title: impl Into<String>, url: impl Into<String>, snippet: impl Into<String>) -> Self {
        SearchResult { title: title.into(), url: url.into(), snippet: snippet.into() }
    }
}

/// A paginated web search backend.
pub trait SearchProvider: Send + Sync {
    /// Fetches page `page` (zero based) of `page_size` results for `query`.
    fn search(&self, query: &str, page: usize, page_size: usize) -> Result<Vec<SearchResult>, SearchError>;
}

pub fn clamp_page_size(page_size: usize) -> usize {
    page_size.clamp(1, 100)
}

#[derive(Deserialize)]
struct SerpResponse {
    #[serde(default)]
    organic_results: Vec<OrganicResult>,
}

#[derive(Deserialize)]
struct OrganicResult {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    link: Option<String>,
    #[serde(default)]
    snippet: Option<String>,
}

/// Decodes a SerpAPI JSON body into results.
pub fn parse_serp_response(body: &str) -> Result<Vec<SearchResult>, SearchError> {
    let parsed: SerpResponse = serde_json::from_str(body).map_err(|e| SearchError::Decode(e.to_string()))?;
    Ok(parsed
        .organic_results
        .into_iter()
        .map(|item| SearchResult {
            title: item.title.unwrap_or_default(),
            url: item.link.unwrap_or_default(),
            snippet: item.snippet.unwrap_or_default(),
        })
        .collect())
}

/// Google results through SerpAPI.
pub struct SerpApiSearch {
    client: Client,
    endpoint: String,
    api_key: SecretString,
}

impl SerpApiSearch {
    pub fn new(api_key: &SecretString) -> Result<Self, SearchError> {
        Self::with_endpoint(api_key, DEFAULT_ENDPOINT)
    }

    pub fn with_endpoint(api_key: &SecretString, endpoint: &str) -> Result<Self, SearchError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(CLIENT_USER_AGENT));

        let client = Client::builder()
            .timeout(SEARCH_TIMEOUT)
            .default_headers(headers)
            .build()
            .map_err(SearchError::Transport)?;

        Ok(SerpApiSearch {
            client,
            endpoint: endpoint.to_string(),
            api_key: SecretString::from(api_key.expose_secret().to_string()),
        })
    }

    /// Query parameters without the key, which is attached at send time.
    fn params(query: &str, page: usize, page_size: usize) -> Vec<(&'static str, String)> {
        let num = clamp_page_size(page_size);
        vec![
            ("q", query.to_string()),
            ("engine", "google".to_string()),
            ("num", num.to_string()),
            ("start", (page * num).to_string()),
        ]
    }
}

impl SearchProvider for SerpApiSearch {
    fn search(&self, query: &str, page: usize, page_size: usize) -> Result<Vec<SearchResult>, SearchError> {
        let params = Self::params(query, page, page_size);
        info!("Searching for: '{}' (page {})", query, page + 1);

        let resp = self
            .client
            .get(&self.endpoint)
            .query(&params)
            .query(&[("api_key", self.api_key.expose_secret())])
            .send()
            .map_err(|e| SearchError::Transport(e.without_url()))?;

        if !resp.status().is_success() {
            warn!("Search failed with status: {}", resp.status());
            return Err(SearchError::Status(resp.status().as_u16()));
        }

        let text = resp.text().map_err(|e| SearchError::Transport(e.without_url()))?;
        let results = parse_serp_response(&text)?;
        debug!("'{}' page {} returned {} results", query, page + 1, results.len());
        Ok(results)
    }
}
