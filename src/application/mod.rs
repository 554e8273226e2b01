//! Application layer: use cases on top of the domain stores.

pub mod events;
pub mod identity;
pub mod reservations;
pub mod tickets;

pub use events::EventService;
pub use identity::{AuthResult, UserChanges, UserService};
pub use reservations::{AdmissionChecker, EventLocks, ReservationService, ReservationView, Ticket};
pub use tickets::{render_ticket, TicketData};
