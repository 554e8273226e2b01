//! Reservation endpoints for participants and administrators

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
