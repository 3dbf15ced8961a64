//! Time handling for quotations and compliance deadlines
//!
//! Two kinds of time rules exist in the engine:
//! - **Validity windows**: a quotation is acceptable while `now` lies in the
//!   half-open window `[quoted_at, expires_at)`. At exactly `expires_at` the
//!   quotation is expired.
//! - **Deadlines**: a compliance may be discharged until `anchor + days`
//!   inclusive; only a strictly later instant exceeds the deadline.
//!
//! Services never call `Utc::now()` directly; they ask a [`Clock`] so tests
//! can move time deterministically.

use std::sync::RwLock;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors related to temporal operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemporalError {
    #[error("Invalid window: start {start} must be before end {end}")]
    InvalidWindow {
        start: String,
        end: String,
    },

    #[error("Day count must be at least 1, got {0}")]
    NonPositiveDays(i64),
}

/// Source of the current instant
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock backed by `Utc::now()`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to
///
/// Used by scenario tests ("quotation created at T0, re-quote at T0 + 4
/// days") and by the in-memory runtime when replaying events.
#[derive(Debug)]
pub struct ManualClock {
    now: RwLock<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: RwLock::new(start),
        }
    }

    /// Moves the clock to an absolute instant
    pub fn set(&self, instant: DateTime<Utc>) {
        if let Ok(mut now) = self.now.write() {
            *now = instant;
        }
    }

    /// Moves the clock forward
    pub fn advance(&self, by: Duration) {
        if let Ok(mut now) = self.now.write() {
            *now += by;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        match self.now.read() {
            Ok(now) => *now,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

/// Half-open validity window `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidityWindow {
    /// When the window opens (inclusive)
    pub start: DateTime<Utc>,
    /// When the window closes (exclusive)
    pub end: DateTime<Utc>,
}

impl ValidityWindow {
    /// Creates a window from explicit bounds
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, TemporalError> {
        if start >= end {
            return Err(TemporalError::InvalidWindow {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self { start, end })
    }

    /// Creates a window lasting `days` whole days from `start`
    pub fn days_from(start: DateTime<Utc>, days: u32) -> Result<Self, TemporalError> {
        if days == 0 {
            return Err(TemporalError::NonPositiveDays(0));
        }
        Ok(Self {
            start,
            end: start + Duration::days(i64::from(days)),
        })
    }

    /// Returns true while `instant` is inside the window
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant < self.end
    }

    /// Returns true once `instant` has reached the end of the window
    pub fn has_expired(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.end
    }
}

/// An inclusive deadline computed from an anchor and a number of days
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deadline {
    /// Instant the countdown started from
    pub anchor: DateTime<Utc>,
    /// Days granted from the anchor
    pub days: u32,
}

impl Deadline {
    pub fn new(anchor: DateTime<Utc>, days: u32) -> Self {
        Self { anchor, days }
    }

    /// The last instant at which the obligation can still be met
    pub fn due_at(&self) -> DateTime<Utc> {
        self.anchor + Duration::days(i64::from(self.days))
    }

    /// Returns true when `instant` is strictly after the due instant
    pub fn is_exceeded(&self, instant: DateTime<Utc>) -> bool {
        instant > self.due_at()
    }
}
