//! Event domain entity

use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::domain::{DomainError, DomainResult};

/// Event publication status
///
/// `Draft` → `Published` → `Canceled`; `Canceled` is terminal and reachable
/// from any other state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventStatus {
    Draft,
    Published,
    Canceled,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
            Self::Canceled => "canceled",
        }
    }

    pub fn can_publish(&self) -> bool {
        *self == Self::Draft
    }

    pub fn can_cancel(&self) -> bool {
        *self != Self::Canceled
    }
}

impl FromStr for EventStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "draft" => Ok(Self::Draft),
            "published" => Ok(Self::Published),
            "canceled" | "cancelled" => Ok(Self::Canceled),
            other => Err(DomainError::Validation(format!(
                "Unknown event status '{}'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for EventStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An event participants can reserve a place for.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub id: String,
    pub title: String,
    pub description: String,
    pub location: String,
    /// When the event takes place
    pub date: DateTime<Utc>,
    /// Maximum number of active reservations, always ≥ 1
    pub capacity: u32,
    pub status: EventStatus,
    /// Reference to an uploaded image (path or URL)
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// Whether the event date lies strictly before `now`.
    pub fn is_past(&self, now: DateTime<Utc>) -> bool {
        self.date < now
    }
}

/// Fields of an event about to be created.
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub title: String,
    pub description: String,
    pub location: String,
    pub date: DateTime<Utc>,
    pub capacity: u32,
    pub status: EventStatus,
    pub image: Option<String>,
}

impl NewEvent {
    pub fn validate(&self) -> DomainResult<()> {
        validate_title(&self.title)?;
        validate_capacity(self.capacity)
    }
}

/// Partial update of an event; `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct EventPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub capacity: Option<u32>,
    pub status: Option<EventStatus>,
    pub image: Option<String>,
}

impl EventPatch {
    pub fn status(status: EventStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        if let Some(capacity) = self.capacity {
            validate_capacity(capacity)?;
        }
        Ok(())
    }

    /// Apply the patch in place and bump `updated_at`.
    pub fn apply_to(self, event: &mut Event, now: DateTime<Utc>) {
        if let Some(v) = self.title {
            event.title = v;
        }
        if let Some(v) = self.description {
            event.description = v;
        }
        if let Some(v) = self.location {
            event.location = v;
        }
        if let Some(v) = self.date {
            event.date = v;
        }
        if let Some(v) = self.capacity {
            event.capacity = v;
        }
        if let Some(v) = self.status {
            event.status = v;
        }
        if let Some(v) = self.image {
            event.image = Some(v);
        }
        event.updated_at = now;
    }
}

/// Listing filter; every bound is optional and inclusive.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub status: Option<EventStatus>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
}

impl EventFilter {
    pub fn matches(&self, event: &Event) -> bool {
        self.status.map_or(true, |s| event.status == s)
            && self.date_from.map_or(true, |from| event.date >= from)
            && self.date_to.map_or(true, |to| event.date <= to)
    }
}

fn validate_title(title: &str) -> DomainResult<()> {
    if title.trim().is_empty() {
        return Err(DomainError::Validation("Title must not be empty".into()));
    }
    Ok(())
}

fn validate_capacity(capacity: u32) -> DomainResult<()> {
    if capacity < 1 {
        return Err(DomainError::Validation(
            "Capacity must be at least 1".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample_event(status: EventStatus) -> Event {
        let now = Utc::now();
        Event {
            id: "evt-1".into(),
            title: "RustConf".into(),
            description: "Talks".into(),
            location: "Lyon".into(),
            date: now + Duration::days(10),
            capacity: 2,
            status,
            image: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn only_drafts_can_be_published() {
        assert!(EventStatus::Draft.can_publish());
        assert!(!EventStatus::Published.can_publish());
        assert!(!EventStatus::Canceled.can_publish());
    }

    #[test]
    fn cancel_allowed_from_any_non_canceled_state() {
        assert!(EventStatus::Draft.can_cancel());
        assert!(EventStatus::Published.can_cancel());
        assert!(!EventStatus::Canceled.can_cancel());
    }

    #[test]
    fn status_parses_both_spellings_of_canceled() {
        assert_eq!("canceled".parse::<EventStatus>().unwrap(), EventStatus::Canceled);
        assert_eq!("Cancelled".parse::<EventStatus>().unwrap(), EventStatus::Canceled);
        assert!("archived".parse::<EventStatus>().is_err());
    }

    #[test]
    fn past_check_is_strict() {
        let mut event = sample_event(EventStatus::Published);
        let now = Utc::now();
        event.date = now;
        assert!(!event.is_past(now));
        assert!(event.is_past(now + Duration::seconds(1)));
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let patch = EventPatch {
            capacity: Some(0),
            ..Default::default()
        };
        assert!(matches!(patch.validate(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn blank_title_is_rejected() {
        let new = NewEvent {
            title: "   ".into(),
            description: String::new(),
            location: String::new(),
            date: Utc::now(),
            capacity: 1,
            status: EventStatus::Draft,
            image: None,
        };
        assert!(new.validate().is_err());
    }

    #[test]
    fn patch_only_touches_given_fields() {
        let mut event = sample_event(EventStatus::Draft);
        let before = event.clone();
        let later = Utc::now() + Duration::minutes(1);
        EventPatch {
            location: Some("Paris".into()),
            ..Default::default()
        }
        .apply_to(&mut event, later);

        assert_eq!(event.location, "Paris");
        assert_eq!(event.title, before.title);
        assert_eq!(event.capacity, before.capacity);
        assert_eq!(event.updated_at, later);
    }

    #[test]
    fn filter_bounds_are_inclusive() {
        let event = sample_event(EventStatus::Published);
        let filter = EventFilter {
            status: Some(EventStatus::Published),
            date_from: Some(event.date),
            date_to: Some(event.date),
        };
        assert!(filter.matches(&event));

        let drafts = EventFilter {
            status: Some(EventStatus::Draft),
            ..Default::default()
        };
        assert!(!drafts.matches(&event));
    }
}
