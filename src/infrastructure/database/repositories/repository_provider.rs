//! SeaORM implementation of RepositoryProvider

use sea_orm::DatabaseConnection;

use crate::domain::{
    EventRepository, RepositoryProvider, ReservationRepository, UserRepositoryInterface,
};

use super::event_repository::SeaOrmEventRepository;
use super::reservation_repository::SeaOrmReservationRepository;
use super::user_repository::UserRepository;

/// Unified repository provider backed by SeaORM.
///
/// Holds one connection pool and exposes per-aggregate repository accessors.
///
/// ```ignore
/// let repos = SeaOrmRepositoryProvider::new(db.clone());
/// let event = repos.events().get("evt-1").await?;
/// ```
pub struct SeaOrmRepositoryProvider {
    events: SeaOrmEventRepository,
    reservations: SeaOrmReservationRepository,
    users: UserRepository,
}

impl SeaOrmRepositoryProvider {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            events: SeaOrmEventRepository::new(db.clone()),
            reservations: SeaOrmReservationRepository::new(db.clone()),
            users: UserRepository::new(db),
        }
    }
}

impl RepositoryProvider for SeaOrmRepositoryProvider {
    fn events(&self) -> &dyn EventRepository {
        &self.events
    }

    fn reservations(&self) -> &dyn ReservationRepository {
        &self.reservations
    }

    fn users(&self) -> &dyn UserRepositoryInterface {
        &self.users
    }
}
