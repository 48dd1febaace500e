//! Shared fixtures: a scripted in-memory site served by a fake engine

use async_trait::async_trait;
use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use sumi_press::config::Config;
use sumi_press::jobs::{JobOutcome, JobService, StartJobParams};
use sumi_press::render::{
    EngineLauncher, PaperFormat, RenderEngine, RenderError, ScrollSize, ViewportSpec,
};
use tempfile::TempDir;
use url::Url;

/// How a page behaves when navigated to
#[derive(Clone)]
pub enum Behavior {
    Load,
    Hang,
    Fail,
}

#[derive(Clone)]
pub struct FakePage {
    pub html: String,
    pub behavior: Behavior,
    pub scroll: ScrollSize,
}

type Hook = Arc<dyn Fn() + Send + Sync>;

/// Pages keyed by URL path, plus a record of what the engines did
#[derive(Default)]
pub struct FakeSite {
    pages: Mutex<HashMap<String, FakePage>>,
    hooks: Mutex<HashMap<String, Hook>>,
    visits: Mutex<Vec<String>>,
    profiles: Mutex<Vec<PathBuf>>,
    shutdowns: Mutex<usize>,
}

impl FakeSite {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn page(&self, path: &str, html: &str) {
        self.insert(path, html, Behavior::Load, 1280, 800);
    }

    pub fn hanging(&self, path: &str) {
        self.insert(path, "", Behavior::Hang, 1280, 800);
    }

    pub fn failing(&self, path: &str) {
        self.insert(path, "", Behavior::Fail, 1280, 800);
    }

    pub fn tall(&self, path: &str, html: &str, width: u32, height: u32) {
        self.insert(path, html, Behavior::Load, width, height);
    }

    fn insert(&self, path: &str, html: &str, behavior: Behavior, width: u32, height: u32) {
        self.pages.lock().unwrap().insert(
            path.to_string(),
            FakePage {
                html: html.to_string(),
                behavior,
                scroll: ScrollSize { width, height },
            },
        );
    }

    /// Runs `hook` whenever `path` is navigated to
    pub fn on_visit(&self, path: &str, hook: impl Fn() + Send + Sync + 'static) {
        self.hooks
            .lock()
            .unwrap()
            .insert(path.to_string(), Arc::new(hook));
    }

    pub fn visits(&self) -> Vec<String> {
        self.visits.lock().unwrap().clone()
    }

    pub fn profiles(&self) -> Vec<PathBuf> {
        self.profiles.lock().unwrap().clone()
    }

    pub fn shutdowns(&self) -> usize {
        *self.shutdowns.lock().unwrap()
    }

    fn lookup(&self, path: &str) -> FakePage {
        self.pages
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .unwrap_or(FakePage {
                html: String::new(),
                behavior: Behavior::Load,
                scroll: ScrollSize {
                    width: 1280,
                    height: 800,
                },
            })
    }
}

pub struct FakeLauncher {
    pub site: Arc<FakeSite>,
    pub fail: bool,
}

#[async_trait]
impl EngineLauncher for FakeLauncher {
    async fn launch(&self, profile_dir: &Path) -> Result<Box<dyn RenderEngine>, RenderError> {
        if self.fail {
            return Err(RenderError::Launch("no browser installed".to_string()));
        }
        self.site
            .profiles
            .lock()
            .unwrap()
            .push(profile_dir.to_path_buf());
        std::fs::create_dir_all(profile_dir).map_err(|e| RenderError::Launch(e.to_string()))?;

        Ok(Box::new(FakeEngine {
            site: self.site.clone(),
            current: String::new(),
            page: None,
        }))
    }
}

struct FakeEngine {
    site: Arc<FakeSite>,
    current: String,
    page: Option<FakePage>,
}

impl FakeEngine {
    fn page(&self) -> Result<&FakePage, RenderError> {
        self.page
            .as_ref()
            .ok_or_else(|| RenderError::Engine("no page loaded".to_string()))
    }
}

#[async_trait]
impl RenderEngine for FakeEngine {
    async fn navigate(&mut self, url: &Url) -> Result<(), RenderError> {
        let path = url.path().to_string();
        self.site.visits.lock().unwrap().push(path.clone());

        let hook = self.site.hooks.lock().unwrap().get(&path).cloned();
        if let Some(hook) = hook {
            hook();
        }

        let page = self.site.lookup(&path);
        match page.behavior {
            Behavior::Load => {}
            Behavior::Hang => tokio::time::sleep(Duration::from_secs(60)).await,
            Behavior::Fail => {
                return Err(RenderError::Navigation {
                    url: url.to_string(),
                    message: "net::ERR_CONNECTION_REFUSED".to_string(),
                })
            }
        }

        self.current = path;
        self.page = Some(page);
        Ok(())
    }

    async fn html(&mut self) -> Result<String, RenderError> {
        Ok(self.page()?.html.clone())
    }

    async fn print_pdf(&mut self, _paper: &PaperFormat) -> Result<Vec<u8>, RenderError> {
        self.page()?;
        Ok(format!("%PDF {}", self.current).into_bytes())
    }

    async fn scroll_size(&mut self) -> Result<ScrollSize, RenderError> {
        Ok(self.page()?.scroll)
    }

    async fn set_viewport(&mut self, _viewport: &ViewportSpec) -> Result<(), RenderError> {
        Ok(())
    }

    async fn capture(&mut self, y: u32, height: u32) -> Result<Vec<u8>, RenderError> {
        Ok(format!("{}:{}+{}", self.current, y, height).into_bytes())
    }

    async fn shutdown(&mut self) -> Result<(), RenderError> {
        *self.site.shutdowns.lock().unwrap() += 1;
        Ok(())
    }
}

/// A configuration suited to fast tests, with scratch space under `scratch`
pub fn test_config(scratch: &TempDir) -> Config {
    let mut config = Config::default();
    config.renderer.navigation_timeout_ms = 200;
    config.scratch.dir = scratch.path().to_path_buf();
    config
}

pub fn service(config: Config, site: &Arc<FakeSite>) -> JobService {
    let launcher = Arc::new(FakeLauncher {
        site: site.clone(),
        fail: false,
    });
    JobService::new(config, launcher)
}

/// Starts a job, streams it into memory and reads the archive back
pub async fn run_job(
    service: &JobService,
    params: StartJobParams,
) -> (JobOutcome, Vec<(String, Vec<u8>)>) {
    let id = service.start_job(params).unwrap();
    let mut out = Vec::new();
    let outcome = service
        .stream_result(&id)
        .unwrap()
        .write_to(&mut out)
        .await
        .unwrap();
    (outcome, read_archive(out))
}

pub fn read_archive(bytes: Vec<u8>) -> Vec<(String, Vec<u8>)> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    (0..archive.len())
        .map(|i| {
            let mut file = archive.by_index(i).unwrap();
            let mut content = Vec::new();
            file.read_to_end(&mut content).unwrap();
            (file.name().to_string(), content)
        })
        .collect()
}

pub fn names(entries: &[(String, Vec<u8>)]) -> Vec<&str> {
    entries.iter().map(|(name, _)| name.as_str()).collect()
}
