//! Reservation store interface

use async_trait::async_trait;

use super::model::{NewReservation, Reservation, ReservationFilter, ReservationStatus};
use crate::domain::DomainResult;

#[async_trait]
pub trait ReservationRepository: Send + Sync {
    /// Persist a new reservation and return it with its generated id.
    ///
    /// Fails with `DuplicateReservation` if the store already holds a
    /// non-canceled reservation for the same (event, user) pair.
    async fn insert(&self, reservation: NewReservation) -> DomainResult<Reservation>;

    /// Find reservation by ID
    async fn get(&self, id: &str) -> DomainResult<Option<Reservation>>;

    /// Count reservations of an event whose status is one of `statuses`
    async fn count_where(&self, event_id: &str, statuses: &[ReservationStatus])
        -> DomainResult<u64>;

    /// Find a reservation for (event, user) whose status is not in `exclude`
    async fn find_one(
        &self,
        event_id: &str,
        user_id: &str,
        exclude: &[ReservationStatus],
    ) -> DomainResult<Option<Reservation>>;

    /// List reservations matching the filter, newest first
    async fn list(&self, filter: ReservationFilter) -> DomainResult<Vec<Reservation>>;

    /// Set the status; `None` when the reservation does not exist
    async fn update_status(
        &self,
        id: &str,
        status: ReservationStatus,
    ) -> DomainResult<Option<Reservation>>;

    /// Compare-and-set on the status: only writes when the reservation is
    /// still `from`. `None` when it does not exist or has moved on.
    async fn update_status_if(
        &self,
        id: &str,
        from: ReservationStatus,
        to: ReservationStatus,
    ) -> DomainResult<Option<Reservation>>;
}
