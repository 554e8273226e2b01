//! Event aggregate
//!
//! Contains the Event entity, its status machine, and the store interface.

pub mod model;
pub mod repository;

pub use model::{Event, EventFilter, EventPatch, EventStatus, NewEvent};
pub use repository::EventRepository;
