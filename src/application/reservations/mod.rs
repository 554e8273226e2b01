//! Reservations: admission, lifecycle and ticket export

pub mod admission;
pub mod locks;
pub mod service;

pub use admission::AdmissionChecker;
pub use locks::{EventLockGuard, EventLocks};
pub use service::{
    EventSummary, ParticipantSummary, ReservationService, ReservationView, Ticket,
};
