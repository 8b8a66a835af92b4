//! Recurring job runner.

use std::collections::HashMap;
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use super::store::{JobStore, JobStoreError};
use super::types::{JobId, JobResult, RunOutcome, ScheduledJob};

/// Job handler function type.
pub type JobHandler = Box<dyn Fn(&ScheduledJob) -> JobResult + Send + Sync>;

/// Runner configuration.
#[derive(Debug, Clone)]
pub struct JobRunnerConfig {
    /// How often to look for due jobs
    pub poll_interval: Duration,
    /// Name for logging (also the thread name)
    pub name: String,
}

impl Default for JobRunnerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(60),
            name: "job-runner".to_string(),
        }
    }
}

impl JobRunnerConfig {
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}

/// Runner statistics.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct RunnerStats {
    pub ticks: u64,
    pub jobs_run: u64,
    pub jobs_failed: u64,
    pub uptime_secs: u64,
}

/// Handle to control a running runner.
#[derive(Debug)]
pub struct JobRunnerHandle {
    shutdown: mpsc::Sender<()>,
    join: Option<thread::JoinHandle<()>>,
    stats: Arc<Mutex<RunnerStats>>,
}

impl JobRunnerHandle {
    /// Request shutdown and wait for the current tick to finish.
    pub fn shutdown(mut self) {
        let _ = self.shutdown.send(());
        if let Some(j) = self.join.take() {
            let _ = j.join();
        }
    }

    pub fn stats(&self) -> RunnerStats {
        match self.stats.lock() {
            Ok(s) => s.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

/// Runs due recurring jobs through handlers registered per hook.
///
/// A run never retries: whatever the outcome, the job is rescheduled for its
/// next occurrence.
pub struct JobRunner<S: JobStore> {
    store: S,
    handlers: HashMap<String, JobHandler>,
}

impl<S: JobStore + 'static> JobRunner<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            handlers: HashMap::new(),
        }
    }

    /// Register the handler for a hook (replaces any previous one).
    pub fn register_handler<F>(&mut self, hook: impl Into<String>, handler: F)
    where
        F: Fn(&ScheduledJob) -> JobResult + Send + Sync + 'static,
    {
        self.handlers.insert(hook.into(), Box::new(handler));
    }

    /// Run one job now and reschedule it.
    pub fn run_job(&self, job: &mut ScheduledJob, now: DateTime<Utc>) -> Result<(), JobStoreError> {
        let outcome = match self.handlers.get(&job.hook) {
            Some(handler) => match handler(job) {
                JobResult::Success => RunOutcome::Completed,
                JobResult::Failure(error) => {
                    warn!(job_id = %job.id, hook = %job.hook, error = %error, "job failed");
                    RunOutcome::Failed { error }
                }
            },
            None => {
                warn!(job_id = %job.id, hook = %job.hook, "no handler for job");
                RunOutcome::NoHandler
            }
        };

        job.record_run(outcome, now);
        debug!(
            job_id = %job.id,
            hook = %job.hook,
            next_run_at = %job.next_run_at,
            "job rescheduled"
        );
        self.store.update(job)
    }

    /// Run every job due at `now`. Returns the outcome per job.
    pub fn run_due(&self, now: DateTime<Utc>) -> Result<Vec<(JobId, RunOutcome)>, JobStoreError> {
        let mut results = Vec::new();
        for mut job in self.store.due(now)? {
            self.run_job(&mut job, now)?;
            if let Some(outcome) = job.last_outcome.clone() {
                results.push((job.id, outcome));
            }
        }
        Ok(results)
    }

    /// Spawn the runner in a background thread.
    pub fn spawn(self, config: JobRunnerConfig) -> std::io::Result<JobRunnerHandle>
    where
        S: Send,
    {
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let stats = Arc::new(Mutex::new(RunnerStats::default()));
        let stats_clone = stats.clone();

        let join = thread::Builder::new()
            .name(config.name.clone())
            .spawn(move || runner_loop(self, config, shutdown_rx, stats_clone))?;

        Ok(JobRunnerHandle {
            shutdown: shutdown_tx,
            join: Some(join),
            stats,
        })
    }
}

fn runner_loop<S: JobStore + 'static>(
    runner: JobRunner<S>,
    config: JobRunnerConfig,
    shutdown_rx: mpsc::Receiver<()>,
    stats: Arc<Mutex<RunnerStats>>,
) {
    info!(runner = %config.name, "job runner started");
    let start_time = Instant::now();

    loop {
        let tick = runner.run_due(Utc::now());

        if let Ok(mut s) = stats.lock() {
            s.ticks += 1;
            s.uptime_secs = start_time.elapsed().as_secs();
            if let Ok(results) = &tick {
                s.jobs_run += results.len() as u64;
                s.jobs_failed += results
                    .iter()
                    .filter(|(_, o)| matches!(o, RunOutcome::Failed { .. }))
                    .count() as u64;
            }
        }

        if let Err(e) = tick {
            error!(runner = %config.name, error = %e, "failed to run due jobs");
        }

        match shutdown_rx.recv_timeout(config.poll_interval) {
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Ok(()) | Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }

    info!(runner = %config.name, "job runner stopped");
}
