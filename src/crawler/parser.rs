//! HTML parser for extracting links and assets
//!
//! This module handles parsing HTML content to extract:
//! - Links to follow (from <a> tags)
//! - Assets to mirror (images, scripts, stylesheets, icons, media)
//! - The page title, for logging

use crate::url::resolve_reference;
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Anchors that are followed as pages
pub(crate) const PAGE_SELECTOR: (&str, &str) = ("a[href]:not([download])", "href");

/// Elements and attributes that reference an asset
pub(crate) const ASSET_SELECTORS: &[(&str, &str)] = &[
    ("img[src]", "src"),
    ("script[src]", "src"),
    ("link[rel~='stylesheet'][href]", "href"),
    ("link[rel~='icon'][href]", "href"),
    ("video[src]", "src"),
    ("audio[src]", "src"),
    ("source[src]", "src"),
    ("video[poster]", "poster"),
];

/// Extracted information from an HTML page
#[derive(Debug, Clone, Default)]
pub struct ParsedPage {
    /// The page title (from <title> tag)
    pub title: Option<String>,

    /// Hyperlinks found on the page (absolute, normalized, deduplicated)
    pub page_links: Vec<Url>,

    /// Assets referenced by the page (absolute, normalized, deduplicated)
    pub asset_links: Vec<Url>,
}

impl ParsedPage {
    /// Total number of references extracted
    pub fn link_count(&self) -> usize {
        self.page_links.len() + self.asset_links.len()
    }
}

/// Parses HTML content and extracts links and assets
///
/// # Link Extraction Rules
///
/// **Pages:**
/// - `<a href="...">`, unless the anchor carries a `download` attribute
///
/// **Assets:**
/// - `<img src>`, `<script src>`, `<video src>`, `<audio src>`, `<source src>`
/// - `<video poster>`
/// - `<link rel="stylesheet" href>`, `<link rel="icon" href>`
///
/// **Exclude:**
/// - `javascript:`, `mailto:`, `tel:` links
/// - Data URIs
/// - Fragment-only and empty references
///
/// Malformed markup is recovered by html5ever, so this never fails; a broken
/// document simply yields fewer links. Scope is not checked here.
///
/// # Arguments
///
/// * `html` - The HTML content to parse
/// * `base_url` - The base URL for resolving relative links (the final URL
///   after redirects)
///
/// # Example
///
/// ```
/// use site_mirror::crawler::parse_html;
/// use url::Url;
///
/// let html = r#"<html><head><title>Test</title></head><body><a href="/page">Link</a><img src="logo.png"></body></html>"#;
/// let base_url = Url::parse("https://example.com/").unwrap();
/// let parsed = parse_html(html, &base_url);
/// assert_eq!(parsed.title, Some("Test".to_string()));
/// assert_eq!(parsed.page_links[0].as_str(), "https://example.com/page");
/// assert_eq!(parsed.asset_links[0].as_str(), "https://example.com/logo.png");
/// ```
pub fn parse_html(html: &str, base_url: &Url) -> ParsedPage {
    let document = Html::parse_document(html);

    ParsedPage {
        title: extract_title(&document),
        page_links: extract_page_links(&document, base_url),
        asset_links: extract_asset_links(&document, base_url),
    }
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

fn extract_page_links(document: &Html, base_url: &Url) -> Vec<Url> {
    let mut links = UniqueUrls::default();

    let (selector, attribute) = PAGE_SELECTOR;
    if let Ok(a_selector) = Selector::parse(selector) {
        for element in document.select(&a_selector) {
            if let Some(href) = element.value().attr(attribute) {
                links.add(resolve_reference(href, base_url));
            }
        }
    }

    links.into_vec()
}

fn extract_asset_links(document: &Html, base_url: &Url) -> Vec<Url> {
    let mut assets = UniqueUrls::default();

    for (selector, attribute) in ASSET_SELECTORS {
        let Ok(selector) = Selector::parse(selector) else {
            continue;
        };

        for element in document.select(&selector) {
            if let Some(value) = element.value().attr(attribute) {
                assets.add(resolve_reference(value, base_url));
            }
        }
    }

    assets.into_vec()
}

/// Insertion-ordered set of URLs
#[derive(Default)]
struct UniqueUrls {
    seen: HashSet<String>,
    urls: Vec<Url>,
}

impl UniqueUrls {
    fn add(&mut self, url: Option<Url>) {
        if let Some(url) = url {
            if self.seen.insert(url.as_str().to_string()) {
                self.urls.push(url);
            }
        }
    }

    fn into_vec(self) -> Vec<Url> {
        self.urls
    }
}
