use regex::Regex;
use scraper::{Html, Selector};
use std::collections::{BTreeSet, HashSet};
use log::debug;
use url::Url;

/// Link text that suggests a contact or submission page.
pub const CONTACT_KEYWORDS: [&str; 8] = [
    "contact", "about", "editor", "pitch", "media", "press", "submit", "guidelines",
];
pub const MAX_CONTACT_LINKS: usize = 10;

/// Anchor text (trimmed, lowercased) paired with its absolute URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    pub text: String,
    pub url: String,
}

pub struct Extractor {
    email_regex: Regex,
    anchor_selector: Selector,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Extractor {
    pub fn new() -> Self {
        Extractor {
            // Patterns are constant and known to compile.
            email_regex: Regex::new(r"(?i)[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,}").unwrap(),
            anchor_selector: Selector::parse("a[href]").unwrap(),
        }
    }

    /// Literal matches, exact-string deduplicated, sorted. Case is not folded.
    pub fn extract_emails(&self, text: &str) -> BTreeSet<String> {
        self.email_regex
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .collect()
    }

    /// All `a[href]` elements with hrefs resolved against `page_url`.
    /// Hrefs that do not resolve are skipped.
    pub fn extract_anchors(&self, html: &str, page_url: &str) -> Vec<Anchor> {
        let base_url = match Url::parse(page_url) {
            Ok(u) => u,
            Err(e) => {
                debug!("Cannot resolve links for {}: {}", page_url, e);
                return Vec::new();
            }
        };

        let document = Html::parse_document(html);
        let mut anchors = Vec::new();
        for element in document.select(&self.anchor_selector) {
            let Some(href) = element.value().attr("href") else { continue };
            match base_url.join(href.trim()) {
                Ok(joined) => anchors.push(Anchor {
                    text: element.text().collect::<String>().trim().to_lowercase(),
                    url: joined.to_string(),
                }),
                Err(e) => debug!("Skipping href '{}' on {}: {}", href, page_url, e),
            }
        }
        anchors
    }

    /// Anchors whose text mentions a contact keyword, unique by URL, in page order.
    pub fn find_contact_links(&self, anchors: &[Anchor]) -> Vec<String> {
        let mut seen = HashSet::new();
        anchors
            .iter()
            .filter(|a| CONTACT_KEYWORDS.iter().any(|kw| a.text.contains(kw)))
            .filter(|a| seen.insert(a.url.as_str()))
            .take(MAX_CONTACT_LINKS)
            .map(|a| a.url.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_dedupe_is_exact_string() {
        let ex = Extractor::new();
        let emails = ex.extract_emails("Mail A@B.com or a@b.com, again a@b.com");
        let emails: Vec<String> = emails.into_iter().collect();
        assert_eq!(emails, vec!["A@B.com", "a@b.com"]);
    }

    #[test]
    fn test_email_sorted() {
        let ex = Extractor::new();
        let emails: Vec<String> = ex
            .extract_emails("<p>zed@site.com</p><a href=\"mailto:editor@site.com\">mail</a> amy@site.org")
            .into_iter()
            .collect();
        assert_eq!(emails, vec!["amy@site.org", "editor@site.com", "zed@site.com"]);
    }

    #[test]
    fn test_no_emails_in_empty_text() {
        assert!(Extractor::new().extract_emails("").is_empty());
    }

    #[test]
    fn test_anchors_resolved_against_page() {
        let ex = Extractor::new();
        let html = r#"
            <a href="/contact">  Contact Us </a>
            <a href="about.html"><span>About</span> <b>Me</b></a>
            <a href="https://other.com/x">Elsewhere</a>
            <a>no href</a>
        "#;
        let anchors = ex.extract_anchors(html, "https://blog.example.com/posts/one");
        assert_eq!(anchors, vec![
            Anchor { text: "contact us".into(), url: "https://blog.example.com/contact".into() },
            Anchor { text: "about me".into(), url: "https://blog.example.com/posts/about.html".into() },
            Anchor { text: "elsewhere".into(), url: "https://other.com/x".into() },
        ]);
    }

    #[test]
    fn test_unresolvable_href_skipped() {
        let ex = Extractor::new();
        let html = r#"<a href="http://[bad">Contact</a><a href="/press">Press</a>"#;
        let anchors = ex.extract_anchors(html, "https://example.com/");
        assert_eq!(anchors.len(), 1);
        assert_eq!(anchors[0].url, "https://example.com/press");
    }

    #[test]
    fn test_malformed_markup_tolerated() {
        let ex = Extractor::new();
        let anchors = ex.extract_anchors("<div><a href='/submit'>Submit<p></div", "https://example.com/");
        assert_eq!(anchors.len(), 1);
        assert!(anchors[0].text.starts_with("submit"));
    }

    #[test]
    fn test_contact_links_filtered_and_deduped() {
        let ex = Extractor::new();
        let anchors = vec![
            Anchor { text: "home".into(), url: "https://x.com/".into() },
            Anchor { text: "contact us".into(), url: "https://x.com/contact".into() },
            Anchor { text: "press room".into(), url: "https://x.com/press".into() },
            Anchor { text: "contact".into(), url: "https://x.com/contact".into() },
            Anchor { text: "submission guidelines".into(), url: "https://x.com/guidelines".into() },
        ];
        assert_eq!(ex.find_contact_links(&anchors), vec![
            "https://x.com/contact",
            "https://x.com/press",
            "https://x.com/guidelines",
        ]);
    }

    #[test]
    fn test_contact_links_capped() {
        let ex = Extractor::new();
        let anchors: Vec<Anchor> = (0..15)
            .map(|i| Anchor { text: "media kit".into(), url: format!("https://x.com/media/{}", i) })
            .collect();
        let links = ex.find_contact_links(&anchors);
        assert_eq!(links.len(), MAX_CONTACT_LINKS);
        assert_eq!(links[0], "https://x.com/media/0");
        assert_eq!(links[9], "https://x.com/media/9");
    }
}
