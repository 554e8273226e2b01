//! Domain layer: entities, status machines and store interfaces.

pub mod event;
pub mod repositories;
pub mod reservation;
pub mod user;

pub use event::{Event, EventFilter, EventPatch, EventRepository, EventStatus, NewEvent};
pub use repositories::{DomainResult, RepositoryProvider};
pub use reservation::{
    NewReservation, Reservation, ReservationFilter, ReservationRepository, ReservationStatus,
};
pub use user::{
    CreateUserDto, GetUserDto, UpdateUserDto, User, UserRepositoryInterface, UserRole,
};

pub use crate::shared::DomainError;
