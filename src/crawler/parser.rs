//! HTML link extraction
//!
//! Workers hand fetched HTML bodies to a `LinkExtractor` and get back the
//! absolute URLs found on the page. Canonicalization and deduplication happen
//! afterwards in the worker.

use scraper::{Html, Selector};
use url::Url;

/// Extracts outbound links from a page body
///
/// Implementations must be pure: the same body and base always give the
/// same links.
pub trait LinkExtractor: Send + Sync {
    fn extract_links(&self, body: &str, base: &Url) -> Vec<String>;
}

/// `LinkExtractor` for HTML documents
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` anywhere in the document
/// - `<link rel="canonical" href="...">`
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` and `data:` links
/// - Fragment-only links
/// - Anything that does not resolve to http or https
///
/// `rel="nofollow"` links are followed.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlLinkExtractor;

impl LinkExtractor for HtmlLinkExtractor {
    fn extract_links(&self, body: &str, base: &Url) -> Vec<String> {
        let document = Html::parse_document(body);
        let mut links = Vec::new();

        if let Ok(anchors) = Selector::parse("a[href]") {
            for element in document.select(&anchors) {
                if element.value().attr("download").is_some() {
                    continue;
                }
                if let Some(link) = element.value().attr("href").and_then(|h| resolve_link(h, base)) {
                    links.push(link);
                }
            }
        }

        if let Ok(canonical) = Selector::parse("link[rel='canonical'][href]") {
            links.extend(
                document
                    .select(&canonical)
                    .filter_map(|e| e.value().attr("href"))
                    .filter_map(|h| resolve_link(h, base)),
            );
        }

        links
    }
}

/// Resolves an href against the page URL
///
/// Returns None for links that are never crawled.
fn resolve_link(href: &str, base: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
    {
        return None;
    }

    let absolute = base.join(href).ok()?;
    match absolute.scheme() {
        "http" | "https" => Some(absolute.to_string()),
        _ => None,
    }
}
