//! Sumi-Press main entry point
//!
//! This is the command-line front end: it starts one export job, streams
//! its archive to a file and prints a summary.

use anyhow::{bail, Context};
use clap::Parser;
use std::path::PathBuf;
use sumi_press::config::{load_config_with_hash, Config};
use sumi_press::jobs::{JobRequest, JobService, StartJobParams};
use sumi_press::output::{format_plan, print_summary};
use sumi_press::{ExportMode, JobState, PressError, ScopeMode};
use tokio::io::AsyncWriteExt;
use tracing_subscriber::EnvFilter;

/// Sumi-Press: export a website into a ZIP of rendered pages
///
/// Sumi-Press crawls a site from a seed URL, renders every page with
/// headless Chrome (as an A4 PDF or as tiled PNG captures) and streams the
/// results into a single archive.
#[derive(Parser, Debug)]
#[command(name = "sumi-press")]
#[command(version)]
#[command(about = "Export a website into a ZIP of rendered pages", long_about = None)]
struct Cli {
    /// Seed URL (http or https)
    #[arg(value_name = "URL")]
    url: String,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Link hops to follow from the seed (1-3)
    #[arg(short, long)]
    depth: Option<u32>,

    /// Which pages relative to the seed to export: only, children, parents, both
    #[arg(short, long)]
    scope: Option<ScopeMode>,

    /// Export mode: document (PDF) or tiles (PNG)
    #[arg(short, long)]
    mode: Option<ExportMode>,

    /// Maximum number of pages to attempt
    #[arg(long)]
    max_pages: Option<u32>,

    /// Pause between pages in milliseconds
    #[arg(long, value_name = "MS")]
    delay_ms: Option<u64>,

    /// Target output width in pixels
    #[arg(short, long, value_name = "PX")]
    width: Option<u32>,

    /// Archive to write
    #[arg(short, long, default_value = "site-export.zip")]
    output: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate parameters and show the initial frontier without exporting
    #[arg(long)]
    dry_run: bool,
}

impl Cli {
    fn start_params(&self) -> StartJobParams {
        StartJobParams {
            url: self.url.clone(),
            depth: self.depth,
            scope: self.scope,
            page_delay_ms: self.delay_ms,
            max_pages: self.max_pages,
            resolution: self.width,
            mode: self.mode,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    if cli.dry_run {
        return handle_dry_run(&cli, &config);
    }

    handle_export(&cli, config).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_press=info,warn"),
            1 => EnvFilter::new("sumi_press=debug,info"),
            2 => EnvFilter::new("sumi_press=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles --dry-run: validates the request and prints the plan
fn handle_dry_run(cli: &Cli, config: &Config) -> anyhow::Result<()> {
    let request = JobRequest::from_params(&cli.start_params(), config)?;

    println!("{}", format_plan(&request));
    println!("✓ Parameters are valid");
    println!("✓ Archive would be written to {}", cli.output.display());

    Ok(())
}

/// Runs one export job to completion
async fn handle_export(cli: &Cli, config: Config) -> anyhow::Result<()> {
    let service = JobService::with_chromium(config);
    let id = service.start_job(cli.start_params())?;
    tracing::info!("Started job {}", id);

    let cancel = {
        let service = service.clone();
        let id = id.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupt received, finishing the archive with pages exported so far");
                match service.cancel_job(&id) {
                    Ok(()) | Err(PressError::NotFound(_)) => {}
                    Err(e) => tracing::error!("Failed to cancel job: {}", e),
                }
            }
        })
    };

    let stream = service.stream_result(&id)?;
    tracing::debug!(
        content_type = stream.content_type(),
        filename = stream.attachment_filename(),
        "Streaming result"
    );

    let mut file = tokio::fs::File::create(&cli.output)
        .await
        .with_context(|| format!("cannot create {}", cli.output.display()))?;

    let result = stream.write_to(&mut file).await;
    cancel.abort();

    let outcome = result.context("export aborted")?;
    file.flush().await?;

    if !cli.quiet {
        print_summary(&outcome, cli.verbose > 0);
        println!("Archive: {}", cli.output.display());
    }

    if outcome.state == JobState::Failed {
        bail!(
            "export failed: {}",
            outcome.error.as_deref().unwrap_or("unknown error")
        );
    }

    Ok(())
}
