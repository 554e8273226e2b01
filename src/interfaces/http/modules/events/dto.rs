//! Event DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::domain::{DomainError, DomainResult, Event, EventFilter, EventPatch, EventStatus, NewEvent};

/// Event API representation
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EventDto {
    pub id: String,
    pub title: String,
    pub description: String,
    pub location: String,
    pub date: DateTime<Utc>,
    pub capacity: u32,
    /// draft, published, canceled
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Event> for EventDto {
    fn from(e: Event) -> Self {
        Self {
            id: e.id,
            title: e.title,
            description: e.description,
            location: e.location,
            date: e.date,
            capacity: e.capacity,
            status: e.status.to_string(),
            image: e.image,
            created_at: e.created_at,
            updated_at: e.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateEventRequest {
    #[validate(length(min = 1, max = 200, message = "title must be 1–200 characters"))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
    pub date: DateTime<Utc>,
    #[validate(range(min = 1, message = "capacity must be at least 1"))]
    pub capacity: u32,
    /// Only `draft` is accepted; omitted means draft
    pub status: Option<String>,
    /// Path or URL of an already uploaded image
    pub image: Option<String>,
}

impl CreateEventRequest {
    pub fn into_new_event(self) -> DomainResult<NewEvent> {
        let status = match self.status.as_deref() {
            Some(s) => s.parse()?,
            None => EventStatus::Draft,
        };
        Ok(NewEvent {
            title: self.title,
            description: self.description,
            location: self.location,
            date: self.date,
            capacity: self.capacity,
            status,
            image: self.image,
        })
    }
}

/// Field edits; status changes go through publish / cancel.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateEventRequest {
    #[validate(length(min = 1, max = 200, message = "title must be 1–200 characters"))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub date: Option<DateTime<Utc>>,
    #[validate(range(min = 1, message = "capacity must be at least 1"))]
    pub capacity: Option<u32>,
    pub image: Option<String>,
}

impl From<UpdateEventRequest> for EventPatch {
    fn from(r: UpdateEventRequest) -> Self {
        Self {
            title: r.title,
            description: r.description,
            location: r.location,
            date: r.date,
            capacity: r.capacity,
            status: None,
            image: r.image,
        }
    }
}

/// Admin listing filter
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListEventsParams {
    /// draft, published or canceled
    pub status: Option<String>,
    /// Inclusive lower bound (RFC 3339)
    pub date_from: Option<DateTime<Utc>>,
    /// Inclusive upper bound (RFC 3339)
    pub date_to: Option<DateTime<Utc>>,
}

impl ListEventsParams {
    pub fn into_filter(self) -> Result<EventFilter, DomainError> {
        Ok(EventFilter {
            status: self.status.as_deref().map(str::parse).transpose()?,
            date_from: self.date_from,
            date_to: self.date_to,
        })
    }
}

/// Public listing window
#[derive(Debug, Deserialize, IntoParams)]
pub struct PublishedEventsParams {
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
}
