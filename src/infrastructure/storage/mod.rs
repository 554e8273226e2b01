//! In-memory store implementations

mod memory;

pub use memory::{
    InMemoryEventRepository, InMemoryRepositoryProvider, InMemoryReservationRepository,
    InMemoryUserRepository,
};
