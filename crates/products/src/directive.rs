//! Scheduled out-of-stock directive: the per-product (target date, enabled)
//! pair that drives the daily stock sweep.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use stockdate_core::{DomainError, DomainResult, ValueObject};

use crate::sanitize::sanitize_text_field;

const ISO_DATE: &str = "%Y-%m-%d";

/// Target date as entered on the admin form.
///
/// Holds the sanitized text verbatim. Under the permissive input policy this
/// may not be a real calendar date; comparisons are lexical on the ISO form,
/// so a malformed value never panics, it just compares however it compares.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetDate(String);

impl TargetDate {
    /// Wrap already-sanitized text. Empty text and a bare `"0"` both mean
    /// "no target date".
    pub fn new(text: impl Into<String>) -> Option<Self> {
        let text = text.into();
        if text.is_empty() || text == "0" { None } else { Some(Self(text)) }
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self(date.format(ISO_DATE).to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The calendar date, if the text is a well-formed `YYYY-MM-DD` date.
    pub fn to_naive_date(&self) -> Option<NaiveDate> {
        let date = NaiveDate::parse_from_str(&self.0, ISO_DATE).ok()?;
        // Reject non-padded forms like `2024-1-5`.
        (date.format(ISO_DATE).to_string() == self.0).then_some(date)
    }

    /// `today >= target`, compared lexically on ISO text.
    pub fn is_due_on(&self, today: NaiveDate) -> bool {
        let today = today.format(ISO_DATE).to_string();
        today.as_str() >= self.0.as_str()
    }
}

impl core::fmt::Display for TargetDate {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// How form input for the target date is validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateInputPolicy {
    /// Store the sanitized text as-is, whatever it is.
    #[default]
    Permissive,
    /// Require a `YYYY-MM-DD` calendar date (or nothing).
    Strict,
}

impl DateInputPolicy {
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        match s.trim().to_lowercase().as_str() {
            "permissive" => Ok(DateInputPolicy::Permissive),
            "strict" => Ok(DateInputPolicy::Strict),
            other => Err(DomainError::validation(format!(
                "unknown date input policy: {other:?}"
            ))),
        }
    }

    /// Turn raw form input into a target date.
    ///
    /// A missing field and an empty (after sanitizing) field both mean "no
    /// target date".
    pub fn parse_target_date(&self, raw: Option<&str>) -> DomainResult<Option<TargetDate>> {
        let sanitized = raw.map(sanitize_text_field).unwrap_or_default();
        let Some(target) = TargetDate::new(sanitized) else {
            return Ok(None);
        };

        match self {
            DateInputPolicy::Permissive => Ok(Some(target)),
            DateInputPolicy::Strict => match target.to_naive_date() {
                Some(_) => Ok(Some(target)),
                None => Err(DomainError::validation(format!(
                    "target date must be a YYYY-MM-DD calendar date, got {:?}",
                    target.as_str()
                ))),
            },
        }
    }
}

/// Outcome of evaluating a directive against a calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectiveDecision {
    Disabled,
    NoTargetDate,
    NotYetDue,
    Due,
}

/// Scheduled-stock directive for one product.
///
/// The default is disabled with no target date, which is what an admin sees
/// the first time the form is opened.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StockDirective {
    pub target_date: Option<TargetDate>,
    pub enabled: bool,
}

impl ValueObject for StockDirective {}

impl StockDirective {
    pub fn new(target_date: Option<TargetDate>, enabled: bool) -> Self {
        Self { target_date, enabled }
    }

    pub fn evaluate(&self, today: NaiveDate) -> DirectiveDecision {
        let Some(target) = &self.target_date else {
            return DirectiveDecision::NoTargetDate;
        };
        if !self.enabled {
            return DirectiveDecision::Disabled;
        }
        if target.is_due_on(today) {
            DirectiveDecision::Due
        } else {
            DirectiveDecision::NotYetDue
        }
    }

    pub fn is_due(&self, today: NaiveDate) -> bool {
        self.evaluate(today) == DirectiveDecision::Due
    }
}
