//! Retry policy and per-attempt outcomes.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use backoff::{backoff::Backoff, ExponentialBackoff};
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::persona::PersonaDraft;

// ─────────────────────────────────────────────────────────────────
// Policy
// ─────────────────────────────────────────────────────────────────

/// Delay growth between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackoffKind {
    /// `base * 2^attempt`
    #[default]
    Exponential,
    /// `base * attempt`
    Linear,
}

impl FromStr for BackoffKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "exponential" => Ok(BackoffKind::Exponential),
            "linear" => Ok(BackoffKind::Linear),
            _ => Err(format!("Unknown backoff '{}'. Valid: exponential, linear", s)),
        }
    }
}

/// What an invalid draft means for the current item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ValidationPolicy {
    /// Validation errors count as a failed attempt and are retried
    #[default]
    RetryOnInvalid,
    /// Warnings are accepted; validation errors send the item straight to
    /// fallback without spending further attempts
    AcceptWithWarnings,
}

impl FromStr for ValidationPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "retry-on-invalid" => Ok(ValidationPolicy::RetryOnInvalid),
            "accept-with-warnings" => Ok(ValidationPolicy::AcceptWithWarnings),
            _ => Err(format!(
                "Unknown validation policy '{}'. Valid: retry-on-invalid, accept-with-warnings",
                s
            )),
        }
    }
}

impl fmt::Display for ValidationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationPolicy::RetryOnInvalid => write!(f, "retry-on-invalid"),
            ValidationPolicy::AcceptWithWarnings => write!(f, "accept-with-warnings"),
        }
    }
}

/// Attempt budget and backoff schedule shared by every item of a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: BackoffKind,
    pub base_delay: Duration,
    pub validation: ValidationPolicy,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: BackoffKind::Exponential,
            base_delay: Duration::from_secs(1),
            validation: ValidationPolicy::RetryOnInvalid,
        }
    }
}

impl RetryPolicy {
    /// Fresh delay schedule for one item
    pub fn schedule(&self) -> BackoffSchedule {
        match self.backoff {
            BackoffKind::Linear => BackoffSchedule::Linear {
                base: self.base_delay,
                attempt: 0,
            },
            BackoffKind::Exponential => {
                let initial = self.base_delay.saturating_mul(2);
                let mut backoff = ExponentialBackoff {
                    initial_interval: initial,
                    randomization_factor: 0.0,
                    multiplier: 2.0,
                    max_interval: initial.saturating_mul(1u32 << self.max_attempts.min(16)),
                    max_elapsed_time: None,
                    ..Default::default()
                };
                backoff.reset();
                BackoffSchedule::Exponential(backoff)
            }
        }
    }

    /// Sum of every delay a fully failing item waits
    pub fn total_delay(&self) -> Duration {
        let mut schedule = self.schedule();
        (1..self.max_attempts).map(|_| schedule.next_delay()).sum()
    }
}

/// Delays between consecutive attempts of one item.
pub enum BackoffSchedule {
    Exponential(ExponentialBackoff),
    Linear { base: Duration, attempt: u32 },
}

impl BackoffSchedule {
    /// Delay after the next failed attempt
    pub fn next_delay(&mut self) -> Duration {
        match self {
            BackoffSchedule::Exponential(backoff) => backoff
                .next_backoff()
                .unwrap_or(backoff.max_interval),
            BackoffSchedule::Linear { base, attempt } => {
                *attempt += 1;
                base.saturating_mul(*attempt)
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Outcomes
// ─────────────────────────────────────────────────────────────────

/// Result of one generation attempt.
#[derive(Debug)]
pub enum AttemptOutcome {
    /// A sanitized, validated draft
    Accepted(PersonaDraft),
    /// Worth another attempt
    Retryable(String),
    /// Give up on this item and use fallback
    Rejected(String),
    /// Abort the whole batch
    Fatal(Error),
}

impl AttemptOutcome {
    /// Classify an error from the client or parser. Errors that are neither
    /// fatal nor transient (e.g. HTTP 400) send the item straight to fallback.
    pub fn from_error(error: Error) -> Self {
        if error.is_fatal() {
            AttemptOutcome::Fatal(error)
        } else if error.is_retryable() {
            AttemptOutcome::Retryable(error.to_string())
        } else {
            AttemptOutcome::Rejected(error.to_string())
        }
    }

    pub fn kind(&self) -> OutcomeKind {
        match self {
            AttemptOutcome::Accepted(_) => OutcomeKind::Accepted,
            AttemptOutcome::Retryable(_) => OutcomeKind::Retryable,
            AttemptOutcome::Rejected(_) => OutcomeKind::Rejected,
            AttemptOutcome::Fatal(_) => OutcomeKind::Fatal,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeKind {
    Accepted,
    Retryable,
    Rejected,
    Fatal,
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            OutcomeKind::Accepted => "accepted",
            OutcomeKind::Retryable => "retryable",
            OutcomeKind::Rejected => "rejected",
            OutcomeKind::Fatal => "fatal",
        };
        f.write_str(label)
    }
}

/// What the per-attempt hook sees.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttemptRecord {
    /// 0-based item index
    pub item: usize,
    /// 1-based attempt number
    pub attempt: u32,
    pub outcome: OutcomeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Delay before the next attempt, if one follows
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay: Option<Duration>,
}

/// Called once per attempt, in order.
pub type AttemptHook = Arc<dyn Fn(&AttemptRecord) + Send + Sync>;
