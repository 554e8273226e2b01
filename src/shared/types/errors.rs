use thiserror::Error;

/// Errors surfaced by domain and application operations.
///
/// Every variant is a recoverable, caller-visible condition. The HTTP layer
/// maps each kind to its own status code and message.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("{entity} not found: {field}={value}")]
    NotFound {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("Event {0} is not available for reservation")]
    EventNotAvailable(String),

    #[error("Event {0} has already taken place")]
    EventInPast(String),

    #[error("Event {0} is full")]
    EventFull(String),

    #[error("User {user_id} already has a reservation for event {event_id}")]
    DuplicateReservation { event_id: String, user_id: String },

    #[error("{entity} cannot move from '{from}' to '{to}'")]
    InvalidTransition {
        entity: &'static str,
        from: String,
        to: String,
    },

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Ticket unavailable: {0}")]
    TicketUnavailable(String),

    #[error("Validation: {0}")]
    Validation(String),

    #[error("Already exists: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl DomainError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            field: "id",
            value: id.into(),
        }
    }

    /// Short snake_case name of the variant, used as a metric label.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::EventNotAvailable(_) => "event_not_available",
            Self::EventInPast(_) => "event_in_past",
            Self::EventFull(_) => "event_full",
            Self::DuplicateReservation { .. } => "duplicate_reservation",
            Self::InvalidTransition { .. } => "invalid_transition",
            Self::Forbidden(_) => "forbidden",
            Self::TicketUnavailable(_) => "ticket_unavailable",
            Self::Validation(_) => "validation",
            Self::Conflict(_) => "conflict",
            Self::Unauthorized(_) => "unauthorized",
            Self::Storage(_) => "storage",
        }
    }

    /// Whether this error is likely transient (e.g. DB connection lost)
    /// and the operation may succeed if retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, DomainError::Storage(_))
    }
}

impl From<sea_orm::DbErr> for DomainError {
    fn from(e: sea_orm::DbErr) -> Self {
        DomainError::Storage(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_storage_errors_are_transient() {
        assert!(DomainError::Storage("connection reset".into()).is_transient());
        assert!(!DomainError::EventFull("e1".into()).is_transient());
        assert!(!DomainError::not_found("Event", "e1").is_transient());
    }

    #[test]
    fn admission_errors_have_distinct_messages() {
        let full = DomainError::EventFull("e1".into()).to_string();
        let dup = DomainError::DuplicateReservation {
            event_id: "e1".into(),
            user_id: "u1".into(),
        }
        .to_string();
        assert_ne!(full, dup);
        assert_eq!(full, "Event e1 is full");
    }

    #[test]
    fn not_found_message_names_entity() {
        let e = DomainError::not_found("Reservation", "r-42");
        assert_eq!(e.to_string(), "Reservation not found: id=r-42");
    }
}
