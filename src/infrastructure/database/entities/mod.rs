//! Database entities module

pub mod event;
pub mod reservation;
pub mod user;

pub use event::Entity as Event;
pub use reservation::Entity as Reservation;
pub use user::Entity as User;
