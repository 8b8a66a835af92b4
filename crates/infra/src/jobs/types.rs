//! Core recurring-job types.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique job identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Longest custom interval accepted (ten years).
pub const MAX_INTERVAL_SECS: u64 = 10 * 365 * 86_400;

/// How often a job repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recurrence {
    Hourly,
    TwiceDaily,
    Daily,
    Weekly,
    /// Custom interval in seconds, between one second and [`MAX_INTERVAL_SECS`].
    EverySecs(u64),
}

impl Recurrence {
    pub fn interval_secs(&self) -> i64 {
        match self {
            Recurrence::Hourly => 3_600,
            Recurrence::TwiceDaily => 43_200,
            Recurrence::Daily => 86_400,
            Recurrence::Weekly => 604_800,
            Recurrence::EverySecs(secs) => (*secs).clamp(1, MAX_INTERVAL_SECS) as i64,
        }
    }

    /// Parse a schedule name (`hourly`, `twicedaily`, `daily`, `weekly`) or a
    /// number of seconds up to [`MAX_INTERVAL_SECS`].
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().to_lowercase();
        match s.as_str() {
            "hourly" => Some(Recurrence::Hourly),
            "twicedaily" | "twice_daily" => Some(Recurrence::TwiceDaily),
            "daily" => Some(Recurrence::Daily),
            "weekly" => Some(Recurrence::Weekly),
            other => other
                .parse::<u64>()
                .ok()
                .filter(|secs| (1..=MAX_INTERVAL_SECS).contains(secs))
                .map(Recurrence::EverySecs),
        }
    }

    /// Next due time after a run that was due at `previous`.
    ///
    /// Normally `previous + interval`. When runs were missed, skip forward to
    /// the next interval boundary after `now` instead of catching up.
    pub fn next_after(&self, previous: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
        let interval = self.interval_secs();
        let next = advance(previous, interval);
        if next > now {
            return next;
        }
        let elapsed = (now - previous).num_seconds().max(0);
        advance(now, interval - elapsed % interval)
    }
}

/// `from + secs`, saturating at the latest representable instant.
fn advance(from: DateTime<Utc>, secs: i64) -> DateTime<Utc> {
    TimeDelta::try_seconds(secs)
        .and_then(|step| from.checked_add_signed(step))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Outcome of the last run of a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum RunOutcome {
    Completed,
    Failed { error: String },
    /// Nothing was registered for the hook; the job was only rescheduled.
    NoHandler,
}

/// Result returned by a job handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobResult {
    Success,
    Failure(String),
}

/// A registered recurring job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledJob {
    pub id: JobId,
    /// Hook name handlers are registered under.
    pub hook: String,
    pub recurrence: Recurrence,
    pub next_run_at: DateTime<Utc>,
    pub last_run_at: Option<DateTime<Utc>>,
    pub last_outcome: Option<RunOutcome>,
    pub run_count: u64,
    pub created_at: DateTime<Utc>,
}

impl ScheduledJob {
    pub fn new(hook: impl Into<String>, recurrence: Recurrence, first_run_at: DateTime<Utc>) -> Self {
        Self {
            id: JobId::new(),
            hook: hook.into(),
            recurrence,
            next_run_at: first_run_at,
            last_run_at: None,
            last_outcome: None,
            run_count: 0,
            created_at: Utc::now(),
        }
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_run_at <= now
    }

    /// Record a run at `now` and move `next_run_at` forward.
    pub fn record_run(&mut self, outcome: RunOutcome, now: DateTime<Utc>) {
        self.last_run_at = Some(now);
        self.last_outcome = Some(outcome);
        self.run_count += 1;
        self.next_run_at = self.recurrence.next_after(self.next_run_at, now);
    }
}
