//! Recurring job storage.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};

use super::types::{JobId, Recurrence, ScheduledJob};

/// Recurring job store abstraction.
pub trait JobStore: Send + Sync {
    /// The registration for a hook, if any (earliest due first when there are several).
    fn next_scheduled(&self, hook: &str) -> Result<Option<ScheduledJob>, JobStoreError>;

    /// Add a new registration.
    fn schedule(&self, job: ScheduledJob) -> Result<JobId, JobStoreError>;

    /// Persist changes to an existing registration.
    fn update(&self, job: &ScheduledJob) -> Result<(), JobStoreError>;

    /// Jobs due at `now`, earliest first.
    fn due(&self, now: DateTime<Utc>) -> Result<Vec<ScheduledJob>, JobStoreError>;

    /// All registrations, earliest due first.
    fn list(&self) -> Result<Vec<ScheduledJob>, JobStoreError>;

    /// Remove every registration for a hook. Returns how many were removed.
    fn unschedule(&self, hook: &str) -> Result<usize, JobStoreError>;
}

/// Job store error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum JobStoreError {
    #[error("job not found: {0}")]
    NotFound(JobId),
    #[error("job already exists: {0}")]
    AlreadyExists(JobId),
    #[error("storage error: {0}")]
    Storage(String),
}

/// Result of [`ensure_scheduled`].
#[derive(Debug, Clone)]
pub enum Registration {
    /// The hook was already scheduled; nothing changed.
    Existing(ScheduledJob),
    Created(ScheduledJob),
}

impl Registration {
    pub fn job(&self) -> &ScheduledJob {
        match self {
            Registration::Existing(j) | Registration::Created(j) => j,
        }
    }
}

/// Register a recurring hook unless it already is.
///
/// Safe to call on every startup: the store is asked for an existing
/// registration first, so repeated initialization never adds a second job.
pub fn ensure_scheduled<S: JobStore + ?Sized>(
    store: &S,
    hook: &str,
    recurrence: Recurrence,
    first_run_at: DateTime<Utc>,
) -> Result<Registration, JobStoreError> {
    if let Some(existing) = store.next_scheduled(hook)? {
        return Ok(Registration::Existing(existing));
    }
    let job = ScheduledJob::new(hook, recurrence, first_run_at);
    store.schedule(job.clone())?;
    Ok(Registration::Created(job))
}

/// In-memory job store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryJobStore {
    jobs: RwLock<HashMap<JobId, ScheduledJob>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

fn poisoned() -> JobStoreError {
    JobStoreError::Storage("job store lock poisoned".to_string())
}

fn sorted(mut jobs: Vec<ScheduledJob>) -> Vec<ScheduledJob> {
    jobs.sort_by_key(|j| (j.next_run_at, j.created_at));
    jobs
}

impl JobStore for InMemoryJobStore {
    fn next_scheduled(&self, hook: &str) -> Result<Option<ScheduledJob>, JobStoreError> {
        let jobs = self.jobs.read().map_err(|_| poisoned())?;
        Ok(jobs
            .values()
            .filter(|j| j.hook == hook)
            .min_by_key(|j| j.next_run_at)
            .cloned())
    }

    fn schedule(&self, job: ScheduledJob) -> Result<JobId, JobStoreError> {
        let mut jobs = self.jobs.write().map_err(|_| poisoned())?;
        if jobs.contains_key(&job.id) {
            return Err(JobStoreError::AlreadyExists(job.id));
        }
        let id = job.id;
        jobs.insert(id, job);
        Ok(id)
    }

    fn update(&self, job: &ScheduledJob) -> Result<(), JobStoreError> {
        let mut jobs = self.jobs.write().map_err(|_| poisoned())?;
        match jobs.get_mut(&job.id) {
            Some(slot) => {
                *slot = job.clone();
                Ok(())
            }
            None => Err(JobStoreError::NotFound(job.id)),
        }
    }

    fn due(&self, now: DateTime<Utc>) -> Result<Vec<ScheduledJob>, JobStoreError> {
        let jobs = self.jobs.read().map_err(|_| poisoned())?;
        Ok(sorted(
            jobs.values().filter(|j| j.is_due(now)).cloned().collect(),
        ))
    }

    fn list(&self) -> Result<Vec<ScheduledJob>, JobStoreError> {
        let jobs = self.jobs.read().map_err(|_| poisoned())?;
        Ok(sorted(jobs.values().cloned().collect()))
    }

    fn unschedule(&self, hook: &str) -> Result<usize, JobStoreError> {
        let mut jobs = self.jobs.write().map_err(|_| poisoned())?;
        let before = jobs.len();
        jobs.retain(|_, j| j.hook != hook);
        Ok(before - jobs.len())
    }
}

impl<S> JobStore for Arc<S>
where
    S: JobStore + ?Sized,
{
    fn next_scheduled(&self, hook: &str) -> Result<Option<ScheduledJob>, JobStoreError> {
        (**self).next_scheduled(hook)
    }

    fn schedule(&self, job: ScheduledJob) -> Result<JobId, JobStoreError> {
        (**self).schedule(job)
    }

    fn update(&self, job: &ScheduledJob) -> Result<(), JobStoreError> {
        (**self).update(job)
    }

    fn due(&self, now: DateTime<Utc>) -> Result<Vec<ScheduledJob>, JobStoreError> {
        (**self).due(now)
    }

    fn list(&self) -> Result<Vec<ScheduledJob>, JobStoreError> {
        (**self).list()
    }

    fn unschedule(&self, hook: &str) -> Result<usize, JobStoreError> {
        (**self).unschedule(hook)
    }
}
