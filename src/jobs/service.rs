//! Job service: the StartJob / CancelJob / Status / StreamResult boundary
//!
//! A job is registered as `Pending` by `start_job` and driven by the
//! [`ResultStream`] returned from `stream_result`: the traversal runs while
//! the archive is written, so the output receives bytes page by page.

use crate::archive::{ArchiveStreamer, ATTACHMENT_FILENAME, CONTENT_TYPE};
use crate::config::Config;
use crate::crawler::{build_http_client, Coordinator, TraversalEnd};
use crate::export::{ExportSettings, PageExporter, TilingParams};
use crate::jobs::{JobRegistry, JobRequest, StartJobParams};
use crate::render::{ChromiumLauncher, EngineLauncher, PaperFormat, RenderError};
use crate::state::{CrawlJob, JobId, JobLogEntry, JobState, JobStatus};
use crate::PressError;
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWrite;

/// Timeout of one preflight HEAD request
const PREFLIGHT_TIMEOUT: Duration = Duration::from_secs(10);

/// Final report of a delivered job
#[derive(Debug, Clone)]
pub struct JobOutcome {
    pub job_id: JobId,
    pub state: JobState,
    pub pages_attempted: u32,
    pub pages_exported: u32,
    pub pages_failed: u32,
    /// Archive entries written
    pub artifacts: usize,
    /// Bytes written to the output
    pub archive_bytes: u64,
    pub error: Option<String>,
    pub log: Vec<JobLogEntry>,
}

/// Entry point for front ends
///
/// Cheap to clone; clones share the same registry.
#[derive(Clone)]
pub struct JobService {
    config: Arc<Config>,
    registry: Arc<JobRegistry>,
    launcher: Arc<dyn EngineLauncher>,
    preflight: Option<Client>,
}

impl JobService {
    /// Creates a service with its own registry
    pub fn new(config: Config, launcher: Arc<dyn EngineLauncher>) -> Self {
        Self::with_registry(config, launcher, Arc::new(JobRegistry::new()))
    }

    /// Creates a service backed by headless Chrome
    pub fn with_chromium(config: Config) -> Self {
        let launcher = Arc::new(ChromiumLauncher::new(config.renderer.clone()));
        Self::new(config, launcher)
    }

    /// Creates a service over an existing registry
    pub fn with_registry(
        config: Config,
        launcher: Arc<dyn EngineLauncher>,
        registry: Arc<JobRegistry>,
    ) -> Self {
        let preflight = if config.limits.preflight {
            match build_http_client(PREFLIGHT_TIMEOUT) {
                Ok(client) => Some(client),
                Err(e) => {
                    tracing::warn!("Preflight disabled, HTTP client unavailable: {}", e);
                    None
                }
            }
        } else {
            None
        };

        Self {
            config: Arc::new(config),
            registry,
            launcher,
            preflight,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &Arc<JobRegistry> {
        &self.registry
    }

    /// Validates the request and registers a `Pending` job
    ///
    /// # Returns
    ///
    /// * `Ok(JobId)` - The new job's id
    /// * `Err(PressError::InvalidInput)` - Malformed seed or out-of-range parameter
    pub fn start_job(&self, params: StartJobParams) -> Result<JobId, PressError> {
        let request = JobRequest::from_params(&params, &self.config)?;
        let id = JobId::generate(request.seed.url.as_str());
        let job = Arc::new(CrawlJob::new(id.clone(), request));

        let request = job.request();
        job.info(format!("Job created for {}", request.seed.url));
        job.info(format!("Base origin: {}", request.seed.origin));
        job.info(format!(
            "Depth: {}, scope: {}, max pages: {}, mode: {}",
            request.max_depth, request.scope, request.max_pages, request.mode
        ));

        self.registry.insert(job);
        Ok(id)
    }

    /// Sets the job's cancellation flag; repeated calls are no-ops
    ///
    /// A job whose result stream was never claimed has nothing left to
    /// deliver, so it ends `Cancelled` and leaves the registry at once.
    /// Claimed jobs finish their archive and are removed on delivery.
    pub fn cancel_job(&self, id: &JobId) -> Result<(), PressError> {
        let job = self.job(id)?;
        job.cancel();

        if job.claim_stream() {
            job.transition(JobState::Cancelled)?;
            self.registry.remove(id);
            job.info("Job removed before its result was streamed");
        }
        Ok(())
    }

    /// Snapshot of a job's progress and log
    pub fn status(&self, id: &JobId) -> Result<JobStatus, PressError> {
        Ok(self.job(id)?.status())
    }

    /// Claims a job's result stream
    ///
    /// Headers can be taken from the returned stream before any archive byte
    /// is produced.
    ///
    /// # Returns
    ///
    /// * `Ok(ResultStream)` - Ready to drive the job with `write_to`
    /// * `Err(PressError::NotFound)` - Unknown job id
    /// * `Err(PressError::AlreadyStreaming)` - The result was already claimed
    pub fn stream_result(&self, id: &JobId) -> Result<ResultStream, PressError> {
        let job = self.job(id)?;
        if !job.claim_stream() {
            return Err(PressError::AlreadyStreaming(id.clone()));
        }

        Ok(ResultStream {
            job,
            service: self.clone(),
            delivered: false,
        })
    }

    fn job(&self, id: &JobId) -> Result<Arc<CrawlJob>, PressError> {
        self.registry
            .get(id)
            .ok_or_else(|| PressError::NotFound(id.clone()))
    }

    fn export_settings(&self, request: &JobRequest) -> ExportSettings {
        let config = &self.config;
        ExportSettings {
            mode: request.mode,
            tiling: TilingParams {
                target_width: request.viewport_width,
                min_width: config.export.min_viewport_width,
                max_width: config.export.max_viewport_width,
                dpi: config.export.dpi,
                engine_max_height: config.renderer.engine_max_height,
            },
            navigation_timeout: Duration::from_millis(config.renderer.navigation_timeout_ms),
            paper: PaperFormat::A4,
        }
    }

    fn scratch_dir(&self, id: &JobId) -> PathBuf {
        self.config.scratch.dir.join(format!("job-{}", id))
    }
}

/// A claimed result stream
///
/// Dropping the stream before `write_to` completes (for instance when the
/// client disconnects) ends the job and releases its registry entry and
/// scratch directory.
pub struct ResultStream {
    job: Arc<CrawlJob>,
    service: JobService,
    delivered: bool,
}

/// How the run ended before the archive is finalized
enum RunEnd {
    Traversed(TraversalEnd),
    LaunchFailed(RenderError),
}

impl ResultStream {
    pub fn job_id(&self) -> &JobId {
        self.job.id()
    }

    pub fn content_type(&self) -> &'static str {
        CONTENT_TYPE
    }

    pub fn attachment_filename(&self) -> &'static str {
        ATTACHMENT_FILENAME
    }

    /// Runs the job and streams its archive into `out`
    ///
    /// The archive is always finalized unless the output itself fails, so
    /// a cancelled job or one whose browser could not start still yields a
    /// valid (possibly empty) archive. Scratch storage is removed and the job
    /// leaves the registry whatever the outcome.
    ///
    /// # Returns
    ///
    /// * `Ok(JobOutcome)` - The archive was finalized
    /// * `Err(PressError::Archive)` - Writing the output failed; the stream is truncated
    pub async fn write_to<W>(mut self, out: &mut W) -> Result<JobOutcome, PressError>
    where
        W: AsyncWrite + Unpin + Send,
    {
        let job = self.job.clone();
        let scratch = self.service.scratch_dir(job.id());

        let result = self.run(&job, &scratch, out).await;

        remove_scratch(&job, &scratch).await;
        self.service.registry.remove(job.id());
        self.delivered = true;

        let archive_bytes = match result {
            Ok(bytes) => bytes,
            Err(e) => {
                job.error(format!("Fatal error: {}", e));
                job.set_error(e.to_string());
                if job.state().can_transition_to(JobState::Failed) {
                    job.transition(JobState::Failed)?;
                }
                return Err(e);
            }
        };

        let status = job.status();
        Ok(JobOutcome {
            job_id: status.id,
            state: status.state,
            pages_attempted: status.pages_attempted,
            pages_exported: status.pages_exported,
            pages_failed: status.pages_failed,
            artifacts: status.artifacts as usize,
            archive_bytes,
            error: status.error,
            log: status.log,
        })
    }

    /// Drives the job; returns the number of archive bytes written
    async fn run<W>(&self, job: &CrawlJob, scratch: &Path, out: &mut W) -> Result<u64, PressError>
    where
        W: AsyncWrite + Unpin + Send,
    {
        job.transition(JobState::Running)?;

        let service = &self.service;
        let mut archive = ArchiveStreamer::new(out, service.config.export.compression_level);
        let exporter = PageExporter::new(service.export_settings(job.request()));

        let end = match service.launcher.launch(scratch).await {
            Ok(mut engine) => {
                let mut coordinator = Coordinator::new(job, &exporter, service.preflight.as_ref());
                let traversal = coordinator.run(engine.as_mut(), &mut archive).await;

                if let Err(e) = engine.shutdown().await {
                    tracing::warn!(job_id = %job.id(), "Browser shutdown failed: {}", e);
                }

                tracing::debug!(job_id = %job.id(), visited = coordinator.visited_count(), "Traversal finished");
                RunEnd::Traversed(traversal?)
            }
            Err(e) => RunEnd::LaunchFailed(e),
        };

        if let RunEnd::LaunchFailed(e) = &end {
            job.error(format!("Could not start the browser: {}", e));
            job.set_error(e.to_string());
        }

        job.info("Finalizing archive");
        let summary = archive.finalize().await?;
        job.info(format!(
            "Archive ready: {} entries, {} bytes",
            summary.entries, summary.bytes_written
        ));

        let final_state = match end {
            RunEnd::Traversed(TraversalEnd::Cancelled) => JobState::Cancelled,
            RunEnd::Traversed(_) => JobState::Completed,
            RunEnd::LaunchFailed(_) => JobState::Failed,
        };
        job.transition(final_state)?;

        Ok(summary.bytes_written)
    }
}

impl Drop for ResultStream {
    fn drop(&mut self) {
        if self.delivered {
            return;
        }

        let job = self.job.clone();
        job.warn("Result stream dropped before delivery");

        let state = job.state();
        if state.is_active() {
            let next = if state == JobState::Pending {
                JobState::Cancelled
            } else {
                job.set_error("result stream dropped before delivery");
                JobState::Failed
            };
            if let Err(e) = job.transition(next) {
                tracing::debug!(job_id = %job.id(), "Cannot close abandoned job: {}", e);
            }
        }

        self.service.registry.remove(job.id());

        let scratch = self.service.scratch_dir(job.id());
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move { remove_scratch(&job, &scratch).await });
            }
            Err(_) => {
                if let Err(e) = std::fs::remove_dir_all(&scratch) {
                    if e.kind() != std::io::ErrorKind::NotFound {
                        job.warn(format!(
                            "Could not remove scratch dir {}: {}",
                            scratch.display(),
                            e
                        ));
                    }
                }
            }
        }
    }
}

async fn remove_scratch(job: &CrawlJob, scratch: &Path) {
    match tokio::fs::remove_dir_all(scratch).await {
        Ok(()) => tracing::debug!(job_id = %job.id(), "Removed scratch dir {}", scratch.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => job.warn(format!(
            "Could not remove scratch dir {}: {}",
            scratch.display(),
            e
        )),
    }
}
