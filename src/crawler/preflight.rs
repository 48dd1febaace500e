//! Content-type preflight
//!
//! An optional HEAD request sent before a URL is handed to the browser, so
//! PDFs, images and archives linked from a site are not rendered as pages.
//! The probe is advisory: only an explicit non-HTML `Content-Type` skips a
//! page, and any probe failure lets the page through.

use reqwest::{header::CONTENT_TYPE, redirect::Policy, Client};
use std::time::Duration;

/// Outcome of a HEAD probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Preflight {
    /// The server declared an HTML (or XHTML) document
    Html,
    /// The server declared something the browser should not render as a page
    NotHtml { content_type: String },
    /// No usable answer; the page is rendered anyway
    Unknown { reason: String },
}

impl Preflight {
    /// Returns true if the page should be skipped
    pub fn should_skip(&self) -> bool {
        matches!(self, Self::NotHtml { .. })
    }
}

/// Builds the HTTP client used for probes
///
/// # Arguments
///
/// * `timeout` - Overall timeout for one probe
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    let user_agent = format!("sumi-press/{}", env!("CARGO_PKG_VERSION"));

    Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Sends a HEAD request and classifies the declared content type
pub async fn probe_content_type(client: &Client, url: &str) -> Preflight {
    let response = match client.head(url).send().await {
        Ok(response) => response,
        Err(e) => {
            return Preflight::Unknown {
                reason: e.to_string(),
            }
        }
    };

    if !response.status().is_success() {
        return Preflight::Unknown {
            reason: format!("HEAD returned {}", response.status()),
        };
    }

    let Some(content_type) = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
    else {
        return Preflight::Unknown {
            reason: "no Content-Type header".to_string(),
        };
    };

    if is_html_content_type(&content_type) {
        Preflight::Html
    } else {
        Preflight::NotHtml { content_type }
    }
}

/// Returns true for `text/html` and `application/xhtml+xml`, ignoring parameters
pub fn is_html_content_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    essence == "text/html" || essence == "application/xhtml+xml"
}
