//! Reservation domain entity

use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::domain::DomainError;

/// Reservation status
///
/// `Pending` is the initial state. Administrators move it to `Confirmed` or
/// `Refused`; owners and administrators may cancel any non-canceled
/// reservation. `Canceled` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReservationStatus {
    Pending,
    Confirmed,
    Refused,
    Canceled,
}

impl ReservationStatus {
    /// Statuses that count against event capacity.
    pub const ACTIVE: [ReservationStatus; 2] = [Self::Pending, Self::Confirmed];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Refused => "refused",
            Self::Canceled => "canceled",
        }
    }

    /// Pending or confirmed.
    pub fn is_active(&self) -> bool {
        Self::ACTIVE.contains(self)
    }

    /// Targets an administrator may set through a status decision.
    pub fn is_admin_decision(&self) -> bool {
        matches!(self, Self::Confirmed | Self::Refused)
    }

    /// Admin decisions are accepted from any non-canceled state, including
    /// re-deciding an already confirmed or refused reservation.
    pub fn can_decide(&self) -> bool {
        *self != Self::Canceled
    }

    pub fn can_cancel(&self) -> bool {
        *self != Self::Canceled
    }
}

impl FromStr for ReservationStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "refused" => Ok(Self::Refused),
            "canceled" | "cancelled" => Ok(Self::Canceled),
            other => Err(DomainError::Validation(format!(
                "Unknown reservation status '{}'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A participant's place request for an event
#[derive(Debug, Clone, PartialEq)]
pub struct Reservation {
    pub id: String,
    /// Referenced event (non-owning)
    pub event_id: String,
    /// Requesting participant (non-owning)
    pub user_id: String,
    pub status: ReservationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Reservation {
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }
}

/// Fields of a reservation about to be inserted.
#[derive(Debug, Clone)]
pub struct NewReservation {
    pub event_id: String,
    pub user_id: String,
    pub status: ReservationStatus,
}

impl NewReservation {
    pub fn pending(event_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            event_id: event_id.into(),
            user_id: user_id.into(),
            status: ReservationStatus::Pending,
        }
    }
}

/// Listing filter for reservations.
#[derive(Debug, Clone, Default)]
pub struct ReservationFilter {
    pub event_id: Option<String>,
    pub user_id: Option<String>,
}

impl ReservationFilter {
    pub fn by_event(event_id: impl Into<String>) -> Self {
        Self {
            event_id: Some(event_id.into()),
            user_id: None,
        }
    }

    pub fn by_user(user_id: impl Into<String>) -> Self {
        Self {
            event_id: None,
            user_id: Some(user_id.into()),
        }
    }

    pub fn matches(&self, r: &Reservation) -> bool {
        self.event_id.as_deref().map_or(true, |id| r.event_id == id)
            && self.user_id.as_deref().map_or(true, |id| r.user_id == id)
    }
}

// ── Tests ──────────────────────────────────────────────────────
