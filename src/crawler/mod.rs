//! Crawler module for site traversal
//!
//! This module contains the core traversal logic, including:
//! - The FIFO frontier with its visited set
//! - Link discovery on rendered pages
//! - The optional content-type preflight
//! - The per-job traversal loop

mod coordinator;
mod frontier;
mod links;
mod preflight;

pub use coordinator::{Coordinator, TraversalEnd};
pub use frontier::Frontier;
pub use links::{discover_links, DiscoveredLinks};
pub use preflight::{build_http_client, is_html_content_type, probe_content_type, Preflight};
