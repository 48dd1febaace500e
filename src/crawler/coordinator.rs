//! Traversal coordinator - the per-job crawl loop
//!
//! Pops frontier entries breadth-first, exports each page through the job's
//! rendering engine, forwards the artifacts to the archive and feeds newly
//! discovered links back into the frontier. A page that fails is logged and
//! skipped; only an archive write failure stops the loop with an error.

use crate::archive::{ArchiveError, ArchiveStreamer};
use crate::crawler::frontier::Frontier;
use crate::crawler::links::discover_links;
use crate::crawler::preflight::{probe_content_type, Preflight};
use crate::export::PageExporter;
use crate::render::RenderEngine;
use crate::state::CrawlJob;
use crate::url::{derive_page_name, seed_frontier, EntryKind, FrontierEntry, NameRegistry};
use reqwest::Client;
use std::time::Duration;
use tokio::io::AsyncWrite;

/// Longest single sleep while pausing between pages
const DELAY_SLICE: Duration = Duration::from_millis(100);

/// Why the traversal loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalEnd {
    /// The frontier is empty
    Drained,
    /// The job's page limit was reached
    PageLimit,
    /// Cancellation was observed
    Cancelled,
}

/// Main traversal structure for one job
pub struct Coordinator<'a> {
    job: &'a CrawlJob,
    exporter: &'a PageExporter,
    preflight: Option<&'a Client>,
    frontier: Frontier,
    names: NameRegistry,
    /// Depth of the seed entry (ancestor count for parents/both)
    seed_depth: u32,
    attempted: u32,
}

impl<'a> Coordinator<'a> {
    /// Creates a coordinator with the job's initial frontier
    ///
    /// # Arguments
    ///
    /// * `job` - The job being run
    /// * `exporter` - Page exporter configured for the job
    /// * `preflight` - HTTP client for content-type probes, if enabled
    pub fn new(job: &'a CrawlJob, exporter: &'a PageExporter, preflight: Option<&'a Client>) -> Self {
        let request = job.request();
        let initial = seed_frontier(&request.seed, request.scope);
        let seed_depth = initial
            .iter()
            .find(|entry| entry.kind == EntryKind::Seed)
            .map(|entry| entry.depth)
            .unwrap_or(0);

        Self {
            job,
            exporter,
            preflight,
            frontier: Frontier::new(initial),
            names: NameRegistry::new(),
            seed_depth,
            attempted: 0,
        }
    }

    /// Number of distinct URLs dequeued so far
    pub fn visited_count(&self) -> usize {
        self.frontier.visited_count()
    }

    /// Deepest frontier depth that may still be expanded into links
    fn depth_limit(&self) -> u32 {
        self.seed_depth + self.job.request().max_depth
    }

    /// Runs the traversal until the frontier drains, the page limit is hit
    /// or cancellation is observed
    ///
    /// # Returns
    ///
    /// * `Ok(TraversalEnd)` - Why the loop stopped
    /// * `Err(ArchiveError)` - The archive could not be written; fatal
    pub async fn run<W>(
        &mut self,
        engine: &mut dyn RenderEngine,
        archive: &mut ArchiveStreamer<'_, W>,
    ) -> Result<TraversalEnd, ArchiveError>
    where
        W: AsyncWrite + Unpin + Send,
    {
        let job = self.job;
        let request = job.request();
        let origin = &request.seed.origin;

        loop {
            if self.job.is_cancelled() {
                return Ok(TraversalEnd::Cancelled);
            }

            if self.attempted >= request.max_pages {
                self.job
                    .info(format!("Page limit of {} reached", request.max_pages));
                return Ok(TraversalEnd::PageLimit);
            }

            let Some(entry) = self.frontier.pop() else {
                return Ok(TraversalEnd::Drained);
            };

            if self.frontier.is_visited(&entry.url) {
                continue;
            }

            if !origin.contains(&entry.url) {
                tracing::debug!(job_id = %self.job.id(), url = %entry.url, "Skipping foreign URL");
                continue;
            }

            self.frontier.mark_visited(&entry.url);
            self.attempted += 1;
            self.job.record_attempt();
            self.job.info(format!(
                "[{}/{}] {}",
                entry.depth,
                self.depth_limit(),
                entry.url
            ));

            if let Some(client) = self.preflight {
                match probe_content_type(client, entry.url.as_str()).await {
                    Preflight::NotHtml { content_type } => {
                        self.job.warn(format!(
                            "Skipped: {} (content type {})",
                            entry.url, content_type
                        ));
                        self.job.record_failure();
                        self.pause().await;
                        continue;
                    }
                    Preflight::Unknown { reason } => {
                        tracing::debug!(job_id = %self.job.id(), url = %entry.url, %reason, "Preflight inconclusive");
                    }
                    Preflight::Html => {}
                }
            }

            if self.job.is_cancelled() {
                return Ok(TraversalEnd::Cancelled);
            }

            let expand = self.should_expand(&entry);
            let name = self.names.claim(&derive_page_name(&entry.url, origin));

            let result = self
                .exporter
                .export(engine, &entry.url, &name, expand)
                .await;

            if self.job.is_cancelled() {
                self.job
                    .info(format!("Cancelled while exporting {}; page discarded", entry.url));
                return Ok(TraversalEnd::Cancelled);
            }

            match result {
                Ok(export) => {
                    for artifact in &export.artifacts {
                        archive.append(&artifact.name, &artifact.bytes).await?;
                        self.job.info(format!("Saved: {}", artifact.name));
                    }
                    self.job.record_export(export.artifacts.len());

                    if let Some(html) = export.html.as_deref() {
                        self.enqueue_links(html, &entry);
                    }
                }
                Err(e) => {
                    self.job.warn(format!("Skipped: {} ({})", entry.url, e));
                    self.job.record_failure();
                }
            }

            self.pause().await;
        }
    }

    /// Returns true if links found on `entry` may be followed
    fn should_expand(&self, entry: &FrontierEntry) -> bool {
        self.job.request().scope.expands_descendants()
            && entry.kind != EntryKind::Ancestor
            && entry.depth < self.depth_limit()
    }

    fn enqueue_links(&mut self, html: &str, entry: &FrontierEntry) {
        let origin = &self.job.request().seed.origin;
        let found = discover_links(html, &entry.url, origin);

        for invalid in &found.invalid {
            self.job.warn(format!("Invalid link: {}", invalid));
        }

        let mut queued = 0usize;
        for link in found.links {
            let child = FrontierEntry::new(link, entry.depth + 1, EntryKind::Descendant);
            if self.frontier.push(child) {
                queued += 1;
            }
        }

        tracing::debug!(
            job_id = %self.job.id(),
            url = %entry.url,
            queued,
            external = found.external,
            frontier = self.frontier.len(),
            "Links discovered"
        );
    }

    /// Waits the inter-page delay, returning early on cancellation
    async fn pause(&self) {
        let mut remaining = self.job.request().page_delay;
        while !remaining.is_zero() && !self.job.is_cancelled() {
            let step = remaining.min(DELAY_SLICE);
            tokio::time::sleep(step).await;
            remaining -= step;
        }
    }
}
