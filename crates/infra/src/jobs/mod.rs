//! Recurring background jobs.
//!
//! - `ScheduledJob`: a hook name, a recurrence and the next due time
//! - `JobStore`: persistence for registrations (in-memory for now)
//! - `ensure_scheduled`: idempotent check-then-register at startup
//! - `JobRunner`: polls for due jobs, runs the hook's handler, reschedules
//!
//! Runs are best-effort: a late or failed run is not retried, the job simply
//! becomes due again at its next occurrence.

pub mod executor;
pub mod store;
pub mod types;

pub use executor::{JobRunner, JobRunnerConfig, JobRunnerHandle, RunnerStats};
pub use store::{ensure_scheduled, InMemoryJobStore, JobStore, JobStoreError, Registration};
pub use types::{JobId, JobResult, MAX_INTERVAL_SECS, Recurrence, RunOutcome, ScheduledJob};
