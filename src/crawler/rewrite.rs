//! Link rewriting for offline browsing
//!
//! Pages are saved with every in-scope reference that the crawler follows
//! (anchors and the asset attributes the parser extracts) pointing at the
//! mirrored file instead of the live site. References outside the origin are
//! left as they are.

use crate::crawler::parser::{ASSET_SELECTORS, PAGE_SELECTOR};
use crate::url::{is_in_scope, relative_link, resolve_reference, url_to_path};
use scraper::{Html, Node, Selector};
use std::path::Path;
use url::Url;

/// Rewrites the references of a page to point into the mirror
///
/// # Arguments
///
/// * `html` - The page markup
/// * `base_url` - Base for resolving references (the final URL after redirects)
/// * `origin` - The crawl origin; only references inside it are rewritten
/// * `saved_as` - The URL whose mirror path the page is written to; relative
///   links are computed from that file
///
/// Returns the markup unchanged when nothing needs rewriting, otherwise the
/// re-serialized document.
///
/// # Example
///
/// ```
/// use site_mirror::crawler::rewrite_links;
/// use url::Url;
///
/// let page = Url::parse("https://x.test/docs/guide").unwrap();
/// let origin = Url::parse("https://x.test/").unwrap();
/// let html = r#"<a href="/docs/">Docs</a><img src="https://x.test/logo.png">"#;
///
/// let rewritten = rewrite_links(html, &page, &origin, &page);
/// assert!(rewritten.contains(r#"href="../index.html""#));
/// assert!(rewritten.contains(r#"src="../../logo.png""#));
/// ```
pub fn rewrite_links(html: &str, base_url: &Url, origin: &Url, saved_as: &Url) -> String {
    let mut document = Html::parse_document(html);
    let from = url_to_path(saved_as);

    let mut edits = Vec::new();
    for (selector, attribute) in std::iter::once(&PAGE_SELECTOR).chain(ASSET_SELECTORS) {
        let Ok(parsed) = Selector::parse(selector) else {
            continue;
        };

        for element in document.select(&parsed) {
            let Some(value) = element.value().attr(attribute) else {
                continue;
            };
            if let Some(local) = local_reference(value, base_url, origin, &from) {
                edits.push((element.id(), *attribute, local));
            }
        }
    }

    if edits.is_empty() {
        return html.to_string();
    }

    for (id, attribute, local) in edits {
        let Some(mut node) = document.tree.get_mut(id) else {
            continue;
        };
        if let Node::Element(element) = node.value() {
            if let Some((_, value)) = element
                .attrs
                .iter_mut()
                .find(|(name, _)| &*name.local == attribute)
            {
                *value = local.into();
            }
        }
    }

    document.html()
}

/// Maps one attribute value to its mirror-relative form, if it is in scope
fn local_reference(value: &str, base_url: &Url, origin: &Url, from: &Path) -> Option<String> {
    let target = resolve_reference(value, base_url)?;
    if !is_in_scope(&target, origin) {
        return None;
    }

    let mut local = relative_link(from, &url_to_path(&target));

    // Normalization drops the fragment; in-page anchors still work offline
    let fragment = base_url
        .join(value.trim())
        .ok()
        .and_then(|url| url.fragment().map(str::to_string));
    if let Some(fragment) = fragment {
        local.push('#');
        local.push_str(&fragment);
    }

    Some(local)
}
