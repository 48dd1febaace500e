use crate::state::{CrawlJob, JobId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Live jobs keyed by id
///
/// A job is inserted when it is started and removed once its result has
/// been delivered (completed, cancelled or failed).
#[derive(Debug, Default)]
pub struct JobRegistry {
    jobs: Mutex<HashMap<JobId, Arc<CrawlJob>>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn jobs(&self) -> MutexGuard<'_, HashMap<JobId, Arc<CrawlJob>>> {
        self.jobs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn insert(&self, job: Arc<CrawlJob>) {
        self.jobs().insert(job.id().clone(), job);
    }

    pub fn get(&self, id: &JobId) -> Option<Arc<CrawlJob>> {
        self.jobs().get(id).cloned()
    }

    pub fn remove(&self, id: &JobId) -> Option<Arc<CrawlJob>> {
        self.jobs().remove(id)
    }

    pub fn contains(&self, id: &JobId) -> bool {
        self.jobs().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.jobs().len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs().is_empty()
    }
}
