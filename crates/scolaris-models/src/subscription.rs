//! Subscription lifecycle for a school.
//!
//! Pure and clock-injected: every transition takes `now` so the caller
//! decides what time it is. Persisting the result (inside a transaction that
//! holds the school row lock) is the service's job.
//!
//! Effective state precedence:
//!
//! 1. manual `suspended` status wins over everything
//! 2. a paused timer is [`SubscriptionState::Paused`]
//! 3. no end date, or an end date in the future, is active
//! 4. anything else has expired

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use scolaris_auth::SchoolStanding;

use crate::schools::SchoolStatus;

pub const MS_PER_DAY: i64 = 86_400_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionState {
    Active,
    Paused,
    Suspended,
    Expired,
}

impl SubscriptionState {
    pub const ALL: [SubscriptionState; 4] = [
        SubscriptionState::Active,
        SubscriptionState::Paused,
        SubscriptionState::Suspended,
        SubscriptionState::Expired,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionState::Active => "active",
            SubscriptionState::Paused => "paused",
            SubscriptionState::Suspended => "suspended",
            SubscriptionState::Expired => "expired",
        }
    }
}

/// Suspended and expired schools are read-only. A pause freezes time
/// without lapsing it, so paused schools keep write access.
impl From<SubscriptionState> for SchoolStanding {
    fn from(state: SubscriptionState) -> Self {
        match state {
            SubscriptionState::Active | SubscriptionState::Paused => SchoolStanding::Writable,
            SubscriptionState::Suspended => SchoolStanding::Suspended,
            SubscriptionState::Expired => SchoolStanding::Expired,
        }
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionError {
    #[error("Subscription has no end date to pause")]
    NoEndDate,
    #[error("Subscription is already paused")]
    AlreadyPaused,
    #[error("Subscription is not paused")]
    NotPaused,
    #[error("Subscription has already expired")]
    Expired,
    #[error("School is already suspended")]
    AlreadySuspended,
    #[error("School is already active")]
    AlreadyActive,
    #[error("Subscription end date is out of range")]
    OutOfRange,
}

/// `from + delta`, where a missing delta means the delta itself overflowed.
fn shifted(
    from: DateTime<Utc>,
    delta: Option<Duration>,
) -> Result<DateTime<Utc>, SubscriptionError> {
    delta
        .and_then(|d| from.checked_add_signed(d))
        .ok_or(SubscriptionError::OutOfRange)
}

/// The timer and status columns of a school row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription {
    pub status: SchoolStatus,
    pub end_date: Option<DateTime<Utc>>,
    pub is_paused: bool,
    pub paused_remaining_ms: Option<i64>,
}

impl Subscription {
    /// A fresh trial of `days` starting at `now`.
    pub fn trial(days: i64, now: DateTime<Utc>) -> Result<Self, SubscriptionError> {
        Ok(Self {
            status: SchoolStatus::Active,
            end_date: Some(shifted(now, Duration::try_days(days))?),
            is_paused: false,
            paused_remaining_ms: None,
        })
    }

    pub fn state(&self, now: DateTime<Utc>) -> SubscriptionState {
        if self.status == SchoolStatus::Suspended {
            return SubscriptionState::Suspended;
        }
        if self.is_paused {
            return SubscriptionState::Paused;
        }
        match self.end_date {
            None => SubscriptionState::Active,
            Some(end) if end > now => SubscriptionState::Active,
            Some(_) => SubscriptionState::Expired,
        }
    }

    pub fn standing(&self, now: DateTime<Utc>) -> SchoolStanding {
        self.state(now).into()
    }

    /// Milliseconds left: the frozen value while paused, otherwise the
    /// distance to the end date floored at zero. `None` without a timer.
    pub fn remaining_ms(&self, now: DateTime<Utc>) -> Option<i64> {
        if self.is_paused {
            return self.paused_remaining_ms;
        }
        self.end_date
            .map(|end| (end - now).num_milliseconds().max(0))
    }

    pub fn pause(&mut self, now: DateTime<Utc>) -> Result<(), SubscriptionError> {
        if self.is_paused {
            return Err(SubscriptionError::AlreadyPaused);
        }
        let end = self.end_date.ok_or(SubscriptionError::NoEndDate)?;
        if end <= now {
            return Err(SubscriptionError::Expired);
        }

        self.paused_remaining_ms = Some((end - now).num_milliseconds());
        self.is_paused = true;
        Ok(())
    }

    pub fn resume(&mut self, now: DateTime<Utc>) -> Result<(), SubscriptionError> {
        if !self.is_paused {
            return Err(SubscriptionError::NotPaused);
        }
        let remaining = self.paused_remaining_ms.unwrap_or(0);

        self.end_date = Some(shifted(now, Duration::try_milliseconds(remaining))?);
        self.is_paused = false;
        self.paused_remaining_ms = None;
        Ok(())
    }

    /// Adds (or with a negative value removes) whole days.
    ///
    /// A paused timer grows its frozen remainder, floored at zero. A running
    /// timer moves its end date. With no timer or an expired one the new
    /// period starts from `now`. Nothing changes when the result would leave
    /// the representable date range.
    pub fn extend(&mut self, days: i64, now: DateTime<Utc>) -> Result<(), SubscriptionError> {
        if self.is_paused {
            let remaining = self.paused_remaining_ms.unwrap_or(0);
            let grown = days
                .checked_mul(MS_PER_DAY)
                .and_then(|delta| remaining.checked_add(delta))
                .ok_or(SubscriptionError::OutOfRange)?;
            self.paused_remaining_ms = Some(grown.max(0));
            return Ok(());
        }

        let from = match self.end_date {
            Some(end) if end > now => end,
            _ => now,
        };
        self.end_date = Some(shifted(from, Duration::try_days(days))?);
        Ok(())
    }

    pub fn suspend(&mut self) -> Result<(), SubscriptionError> {
        if self.status == SchoolStatus::Suspended {
            return Err(SubscriptionError::AlreadySuspended);
        }
        self.status = SchoolStatus::Suspended;
        Ok(())
    }

    pub fn activate(&mut self) -> Result<(), SubscriptionError> {
        if self.status == SchoolStatus::Active {
            return Err(SubscriptionError::AlreadyActive);
        }
        self.status = SchoolStatus::Active;
        Ok(())
    }

    pub fn summary(&self, now: DateTime<Utc>) -> SubscriptionSummary {
        SubscriptionSummary {
            state: self.state(now),
            status: self.status,
            subscription_end_date: self.end_date,
            is_paused: self.is_paused,
            remaining_ms: self.remaining_ms(now),
        }
    }
}

/// Subscription view returned to clients.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SubscriptionSummary {
    pub state: SubscriptionState,
    pub status: SchoolStatus,
    pub subscription_end_date: Option<DateTime<Utc>>,
    pub is_paused: bool,
    pub remaining_ms: Option<i64>,
}
