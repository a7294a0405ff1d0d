//! Cron schedule parsing and due-window evaluation.
//!
//! Probes declare standard 5-field cron expressions (minute hour
//! day-of-month month day-of-week); minute resolution is the floor. The
//! expression is parsed once, at engine construction, so malformed
//! schedules fail fast instead of at runtime.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use cron::Schedule as CronSchedule;
use thiserror::Error;

/// Errors from parsing a schedule expression.
#[derive(Debug, Error)]
pub enum ScheduleError {
    /// Invalid cron expression.
    #[error("invalid cron expression {expression:?}: {reason}")]
    InvalidCron { expression: String, reason: String },

    /// Wrong number of fields.
    #[error("expected 5 cron fields, got {got} in {expression:?}")]
    FieldCount { expression: String, got: usize },
}

/// A parsed recurrence schedule.
#[derive(Debug, Clone)]
pub struct Schedule {
    expression: String,
    parsed: CronSchedule,
}

impl Schedule {
    /// Parse a 5-field cron expression.
    pub fn parse(expression: &str) -> Result<Self, ScheduleError> {
        let expression = expression.trim();
        let fields = expression.split_whitespace().count();
        if fields != 5 {
            return Err(ScheduleError::FieldCount {
                expression: expression.to_string(),
                got: fields,
            });
        }

        // The cron crate wants a seconds field; pin it to :00.
        let with_seconds = format!("0 {expression}");
        let parsed =
            CronSchedule::from_str(&with_seconds).map_err(|e| ScheduleError::InvalidCron {
                expression: expression.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            expression: expression.to_string(),
            parsed,
        })
    }

    /// The original expression string.
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Next occurrence strictly after the given instant.
    pub fn next_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.parsed.after(&after).next()
    }

    /// Whether an occurrence falls in the half-open window `(last, now]`.
    ///
    /// One tick window maps to at most one trigger; a slow tick does not
    /// produce a burst of missed runs.
    pub fn due_between(&self, last: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        matches!(self.next_after(last), Some(next) if next <= now)
    }
}
