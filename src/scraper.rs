use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE, USER_AGENT};
use std::fmt;
use std::time::Duration;
use log::{debug, info, warn};
use crate::extractor::Extractor;
use crate::filter::extract_domain;
use crate::search_engine::{SearchResult, CLIENT_USER_AGENT};

pub const FETCH_TIMEOUT: Duration = Duration::from_secs(20);
pub const MAX_EMAILS: usize = 5;

/// Why a page produced no content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchFailure {
    Status(u16),
    Transport(String),
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchFailure::Status(code) => write!(f, "HTTP status {}", code),
            FetchFailure::Transport(msg) => write!(f, "transport error: {}", msg),
        }
    }
}

/// Outcome of a page visit. Never an error: a failed visit is empty content with a reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageFetch {
    Content(String),
    Empty { reason: FetchFailure },
}

impl PageFetch {
    pub fn content(&self) -> &str {
        match self {
            PageFetch::Content(html) => html,
            PageFetch::Empty { .. } => "",
        }
    }
}

/// Retrieves raw markup for a URL.
pub trait PageFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> PageFetch;
}

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, reqwest::Error> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        headers.insert(USER_AGENT, HeaderValue::from_static(CLIENT_USER_AGENT));

        let client = Client::builder()
            .timeout(FETCH_TIMEOUT)
            .default_headers(headers)
            .build()?;

        Ok(HttpFetcher { client })
    }
}

impl PageFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> PageFetch {
        let resp = match self.client.get(url).send() {
            Ok(resp) => resp,
            Err(e) => return PageFetch::Empty { reason: FetchFailure::Transport(e.to_string()) },
        };

        let status = resp.status();
        if status.as_u16() >= 400 {
            return PageFetch::Empty { reason: FetchFailure::Status(status.as_u16()) };
        }

        match resp.text() {
            Ok(text) => PageFetch::Content(text),
            Err(e) => PageFetch::Empty { reason: FetchFailure::Transport(e.to_string()) },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScrapeStatus {
    /// Page fetched and at least one email or contact link found.
    Success,
    /// Page fetched, nothing found.
    #[default]
    NoData,
    /// 403 or 429.
    Blocked,
    Error,
}

impl ScrapeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScrapeStatus::Success => "success",
            ScrapeStatus::NoData => "no_data",
            ScrapeStatus::Blocked => "blocked",
            ScrapeStatus::Error => "error",
        }
    }

    fn from_failure(reason: &FetchFailure) -> Self {
        match reason {
            FetchFailure::Status(403) | FetchFailure::Status(429) => ScrapeStatus::Blocked,
            _ => ScrapeStatus::Error,
        }
    }
}

/// A candidate enriched with contact signals.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProspectRecord {
    pub domain: String,
    pub url: String,
    pub title: String,
    pub snippet: String,
    /// Sorted, at most five.
    pub emails: Vec<String>,
    /// Discovery order, at most ten.
    pub contact_links: Vec<String>,
    pub status: ScrapeStatus,
    /// Set when the page could not be fetched.
    pub fetch_failure: Option<FetchFailure>,
}

/// Visits one candidate page and assembles its prospect record.
pub struct SignalExtractor<'f, F: PageFetcher + ?Sized> {
    fetcher: &'f F,
    extractor: Extractor,
}

impl<'f, F: PageFetcher + ?Sized> SignalExtractor<'f, F> {
    pub fn new(fetcher: &'f F) -> Self {
        SignalExtractor { fetcher, extractor: Extractor::new() }
    }

    pub fn extract(&self, candidate: &SearchResult) -> ProspectRecord {
        info!("Visiting: {}", candidate.url);
        let page = self.fetcher.fetch(&candidate.url);

        let mut record = ProspectRecord {
            domain: extract_domain(&candidate.url),
            url: candidate.url.clone(),
            title: candidate.title.clone(),
            snippet: candidate.snippet.clone(),
            ..ProspectRecord::default()
        };

        let html = match page {
            PageFetch::Content(html) => html,
            PageFetch::Empty { reason } => {
                warn!("Failed to fetch {}: {}", candidate.url, reason);
                record.status = ScrapeStatus::from_failure(&reason);
                record.fetch_failure = Some(reason);
                return record;
            }
        };

        if !html.is_empty() {
            record.emails = self
                .extractor
                .extract_emails(&html)
                .into_iter()
                .take(MAX_EMAILS)
                .collect();
            let anchors = self.extractor.extract_anchors(&html, &candidate.url);
            record.contact_links = self.extractor.find_contact_links(&anchors);
        }

        record.status = if record.emails.is_empty() && record.contact_links.is_empty() {
            ScrapeStatus::NoData
        } else {
            ScrapeStatus::Success
        };
        debug!(
            "{}: {} ({} emails, {} contact links)",
            candidate.url,
            record.status.as_str(),
            record.emails.len(),
            record.contact_links.len()
        );
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_server::{refused_url, OneShotServer};
    use std::collections::HashMap;

    struct StaticFetcher {
        pages: HashMap<String, PageFetch>,
    }

    impl StaticFetcher {
        fn new(pages: &[(&str, PageFetch)]) -> Self {
            StaticFetcher {
                pages: pages.iter().map(|(u, p)| (u.to_string(), p.clone())).collect(),
            }
        }
    }

    impl PageFetcher for StaticFetcher {
        fn fetch(&self, url: &str) -> PageFetch {
            self.pages.get(url).cloned().unwrap_or(PageFetch::Empty {
                reason: FetchFailure::Transport("connection refused".into()),
            })
        }
    }

    const PAGE: &str = r#"
        <html><body>
          <p>Send pitches to pitches@foodblog.com or Editor@FoodBlog.com.</p>
          <p>Also: a@foodblog.com b@foodblog.com c@foodblog.com d@foodblog.com</p>
          <a href="/contact">Contact</a>
          <a href="/write-for-us">Submit a guest post</a>
          <a href="/recipes">Recipes</a>
        </body></html>
    "#;

    #[test]
    fn test_extracts_signals() {
        let fetcher = StaticFetcher::new(&[("https://www.foodblog.com/guest", PageFetch::Content(PAGE.into()))]);
        let extractor = SignalExtractor::new(&fetcher);
        let record = extractor.extract(&SearchResult::new("Guest posts", "https://www.foodblog.com/guest", "snip"));

        assert_eq!(record.domain, "foodblog.com");
        assert_eq!(record.title, "Guest posts");
        assert_eq!(record.snippet, "snip");
        assert_eq!(record.emails, vec![
            "Editor@FoodBlog.com",
            "a@foodblog.com",
            "b@foodblog.com",
            "c@foodblog.com",
            "d@foodblog.com",
        ]);
        assert_eq!(record.contact_links, vec![
            "https://www.foodblog.com/contact",
            "https://www.foodblog.com/write-for-us",
        ]);
        assert_eq!(record.status, ScrapeStatus::Success);
        assert_eq!(record.fetch_failure, None);
    }

    #[test]
    fn test_failed_fetch_yields_empty_record() {
        let fetcher = StaticFetcher::new(&[]);
        let extractor = SignalExtractor::new(&fetcher);
        let record = extractor.extract(&SearchResult::new("t", "https://down.com/x", "s"));

        assert_eq!(record.domain, "down.com");
        assert!(record.emails.is_empty());
        assert!(record.contact_links.is_empty());
        assert_eq!(record.status, ScrapeStatus::Error);
        assert!(matches!(record.fetch_failure, Some(FetchFailure::Transport(_))));
    }

    #[test]
    fn test_blocked_status() {
        let fetcher = StaticFetcher::new(&[
            ("https://a.com/", PageFetch::Empty { reason: FetchFailure::Status(429) }),
            ("https://b.com/", PageFetch::Empty { reason: FetchFailure::Status(404) }),
        ]);
        let extractor = SignalExtractor::new(&fetcher);
        assert_eq!(extractor.extract(&SearchResult::new("", "https://a.com/", "")).status, ScrapeStatus::Blocked);
        assert_eq!(extractor.extract(&SearchResult::new("", "https://b.com/", "")).status, ScrapeStatus::Error);
    }

    #[test]
    fn test_fetched_page_without_signals() {
        let fetcher = StaticFetcher::new(&[("https://quiet.org/", PageFetch::Content("<p>nothing</p>".into()))]);
        let record = SignalExtractor::new(&fetcher).extract(&SearchResult::new("", "https://quiet.org/", ""));
        assert_eq!(record.status, ScrapeStatus::NoData);
        assert_eq!(record.fetch_failure, None);
    }

    #[test]
    fn test_page_fetch_content() {
        assert_eq!(PageFetch::Content("x".into()).content(), "x");
        assert_eq!(PageFetch::Empty { reason: FetchFailure::Status(500) }.content(), "");
    }

    #[test]
    fn test_http_fetcher_returns_page() {
        let server = OneShotServer::respond("200 OK", "<p>hello@site.com</p>");
        let fetcher = HttpFetcher::new().unwrap();
        let page = fetcher.fetch(&server.url);
        assert_eq!(page, PageFetch::Content("<p>hello@site.com</p>".into()));
        let request = server.request().to_lowercase();
        assert!(request.contains("user-agent: prospectfinder/0.6"));
    }

    #[test]
    fn test_http_fetcher_error_status_is_empty() {
        let server = OneShotServer::respond("404 Not Found", "missing");
        let fetcher = HttpFetcher::new().unwrap();
        assert_eq!(fetcher.fetch(&server.url), PageFetch::Empty { reason: FetchFailure::Status(404) });
        server.request();
    }

    #[test]
    fn test_http_fetcher_transport_error_is_empty() {
        let fetcher = HttpFetcher::new().unwrap();
        let page = fetcher.fetch(&refused_url());
        assert!(matches!(page, PageFetch::Empty { reason: FetchFailure::Transport(_) }));
        assert_eq!(page.content(), "");
    }

    #[test]
    fn test_status_labels() {
        assert_eq!(ScrapeStatus::Success.as_str(), "success");
        assert_eq!(ScrapeStatus::default().as_str(), "no_data");
        assert_eq!(ScrapeStatus::Blocked.as_str(), "blocked");
        assert_eq!(ScrapeStatus::Error.as_str(), "error");
    }
}
