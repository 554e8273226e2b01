//! Reservation DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::application::reservations::{EventSummary, ParticipantSummary};
use crate::application::ReservationView;
use crate::domain::Reservation;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateReservationRequest {
    #[validate(length(min = 1, message = "event_id is required"))]
    pub event_id: String,
}

/// Administrative decision on a reservation.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateStatusRequest {
    /// `confirmed` or `refused`
    #[validate(length(min = 1, message = "status is required"))]
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EventSummaryDto {
    pub id: String,
    pub title: String,
    pub date: DateTime<Utc>,
    pub location: String,
    pub status: String,
}

impl From<EventSummary> for EventSummaryDto {
    fn from(e: EventSummary) -> Self {
        Self {
            id: e.id,
            title: e.title,
            date: e.date,
            location: e.location,
            status: e.status.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ParticipantDto {
    pub id: String,
    pub full_name: String,
    pub email: String,
}

impl From<ParticipantSummary> for ParticipantDto {
    fn from(p: ParticipantSummary) -> Self {
        Self {
            id: p.id,
            full_name: p.full_name,
            email: p.email,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReservationDto {
    pub id: String,
    pub event_id: String,
    pub user_id: String,
    /// pending, confirmed, refused, canceled
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<EventSummaryDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub participant: Option<ParticipantDto>,
}

impl From<Reservation> for ReservationDto {
    fn from(r: Reservation) -> Self {
        Self {
            id: r.id,
            event_id: r.event_id,
            user_id: r.user_id,
            status: r.status.to_string(),
            created_at: r.created_at,
            updated_at: r.updated_at,
            event: None,
            participant: None,
        }
    }
}

impl From<ReservationView> for ReservationDto {
    fn from(v: ReservationView) -> Self {
        Self {
            event: v.event.map(Into::into),
            participant: v.participant.map(Into::into),
            ..Self::from(v.reservation)
        }
    }
}
