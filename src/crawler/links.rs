//! Link discovery on rendered pages
//!
//! Extracts the traversable links of a page: `<a href>` values that are
//! non-empty, not fragment-only, resolve to an http(s) URL and share the
//! job's origin.

use crate::url::{normalize_parsed, Origin};
use crate::PressError;
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Links found on one page
#[derive(Debug, Default)]
pub struct DiscoveredLinks {
    /// Normalized same-origin URLs, in document order, without duplicates
    pub links: Vec<Url>,
    /// Hrefs that could not be resolved
    pub invalid: Vec<PressError>,
    /// Resolved links dropped because they leave the origin
    pub external: usize,
}

/// Extracts same-origin links from rendered HTML
///
/// Relative hrefs are resolved against `page_url`. Anchors with a
/// `download` attribute and `javascript:`, `mailto:`, `tel:` and `data:`
/// hrefs are ignored. A link that fails to resolve is reported in
/// [`DiscoveredLinks::invalid`] and never fails the page.
///
/// # Example
///
/// ```
/// use sumi_press::crawler::discover_links;
/// use sumi_press::url::Origin;
/// use url::Url;
///
/// let page = Url::parse("http://x.test/docs/").unwrap();
/// let origin = Origin::of(&page).unwrap();
/// let html = r##"<a href="intro">Intro</a><a href="https://elsewhere.org/">Out</a><a href="#top">Top</a>"##;
///
/// let found = discover_links(html, &page, &origin);
/// let links: Vec<&str> = found.links.iter().map(|u| u.as_str()).collect();
/// assert_eq!(links, vec!["http://x.test/docs/intro"]);
/// assert_eq!(found.external, 1);
/// ```
pub fn discover_links(html: &str, page_url: &Url, origin: &Origin) -> DiscoveredLinks {
    let document = Html::parse_document(html);
    let mut found = DiscoveredLinks::default();
    let mut seen = HashSet::new();

    let Ok(selector) = Selector::parse("a[href]") else {
        return found;
    };

    for element in document.select(&selector) {
        if element.value().attr("download").is_some() {
            continue;
        }

        let Some(href) = element.value().attr("href") else {
            continue;
        };

        match resolve_link(href, page_url) {
            Ok(Some(url)) => {
                if !origin.contains(&url) {
                    found.external += 1;
                } else if seen.insert(url.clone()) {
                    found.links.push(url);
                }
            }
            Ok(None) => {}
            Err(e) => found.invalid.push(e),
        }
    }

    found
}

/// Resolves an href to a normalized absolute http(s) URL
///
/// Returns `Ok(None)` for hrefs that are never traversable (empty,
/// fragment-only, non-http schemes).
fn resolve_link(href: &str, base_url: &Url) -> Result<Option<Url>, PressError> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return Ok(None);
    }

    let lower = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
    {
        return Ok(None);
    }

    let absolute = base_url
        .join(href)
        .map_err(|e| PressError::LinkResolution {
            href: href.to_string(),
            reason: e.to_string(),
        })?;

    if absolute.scheme() != "http" && absolute.scheme() != "https" {
        return Ok(None);
    }

    normalize_parsed(absolute)
        .map(Some)
        .map_err(|e| PressError::LinkResolution {
            href: href.to_string(),
            reason: e.to_string(),
        })
}
