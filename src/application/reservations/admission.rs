//! Reservation admission
//!
//! Decides whether a participant may take a place at an event. Checks run in
//! a fixed order so the reported reason is deterministic, and the whole
//! sequence runs under the event's lock.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use super::locks::EventLocks;
use crate::domain::{
    DomainError, DomainResult, EventStatus, NewReservation, RepositoryProvider, Reservation,
    ReservationStatus,
};

pub struct AdmissionChecker {
    repos: Arc<dyn RepositoryProvider>,
    locks: EventLocks,
}

impl AdmissionChecker {
    pub fn new(repos: Arc<dyn RepositoryProvider>, locks: EventLocks) -> Self {
        Self { repos, locks }
    }

    /// Create a pending reservation of `event_id` for `user_id`.
    ///
    /// Fails, in this order, with `NotFound`, `EventNotAvailable`,
    /// `EventInPast`, `EventFull` or `DuplicateReservation`. Nothing is
    /// written on failure.
    pub async fn admit(&self, event_id: &str, user_id: &str) -> DomainResult<Reservation> {
        let result = self.admit_locked(event_id, user_id).await;

        let outcome = match &result {
            Ok(_) => "admitted",
            Err(e) => e.kind(),
        };
        metrics::counter!("reservation_admissions_total", "outcome" => outcome).increment(1);

        result
    }

    async fn admit_locked(&self, event_id: &str, user_id: &str) -> DomainResult<Reservation> {
        let _guard = self.locks.acquire(event_id).await;

        let event = self
            .repos
            .events()
            .get(event_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Event", event_id))?;

        if event.status != EventStatus::Published {
            return Err(DomainError::EventNotAvailable(event.id));
        }

        if event.is_past(Utc::now()) {
            return Err(DomainError::EventInPast(event.id));
        }

        let reservations = self.repos.reservations();

        let active = reservations
            .count_where(event_id, &ReservationStatus::ACTIVE)
            .await?;
        if active >= u64::from(event.capacity) {
            debug!(event_id, active, capacity = event.capacity, "Event full");
            return Err(DomainError::EventFull(event.id));
        }

        if reservations
            .find_one(event_id, user_id, &[ReservationStatus::Canceled])
            .await?
            .is_some()
        {
            return Err(DomainError::DuplicateReservation {
                event_id: event.id,
                user_id: user_id.to_string(),
            });
        }

        let reservation = reservations
            .insert(NewReservation::pending(event_id, user_id))
            .await?;

        info!(
            reservation_id = %reservation.id,
            event_id,
            user_id,
            "Reservation admitted"
        );
        Ok(reservation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NewEvent;
    use crate::infrastructure::storage::InMemoryRepositoryProvider;
    use chrono::{DateTime, Duration};

    fn checker() -> (AdmissionChecker, Arc<dyn RepositoryProvider>) {
        let repos: Arc<dyn RepositoryProvider> = Arc::new(InMemoryRepositoryProvider::new());
        (AdmissionChecker::new(repos.clone(), EventLocks::new()), repos)
    }

    async fn event(
        repos: &Arc<dyn RepositoryProvider>,
        status: EventStatus,
        capacity: u32,
        date: DateTime<Utc>,
    ) -> String {
        repos
            .events()
            .insert(NewEvent {
                title: "Meetup".into(),
                description: "Monthly".into(),
                location: "Hall A".into(),
                date,
                capacity,
                status,
                image: None,
            })
            .await
            .unwrap()
            .id
    }

    fn next_week() -> DateTime<Utc> {
        Utc::now() + Duration::days(7)
    }

    #[tokio::test]
    async fn admits_pending_reservation() {
        let (checker, repos) = checker();
        let id = event(&repos, EventStatus::Published, 2, next_week()).await;

        let r = checker.admit(&id, "alice").await.unwrap();
        assert_eq!(r.status, ReservationStatus::Pending);
        assert_eq!(r.event_id, id);
        assert_eq!(r.user_id, "alice");
    }

    #[tokio::test]
    async fn unknown_event_is_not_found() {
        let (checker, _) = checker();
        let err = checker.admit("missing", "alice").await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { entity: "Event", .. }));
    }

    #[tokio::test]
    async fn draft_and_canceled_events_are_not_available() {
        let (checker, repos) = checker();
        for status in [EventStatus::Draft, EventStatus::Canceled] {
            let id = event(&repos, status, 5, next_week()).await;
            let err = checker.admit(&id, "alice").await.unwrap_err();
            assert!(matches!(err, DomainError::EventNotAvailable(_)));
        }
        let count = repos.reservations().list(Default::default()).await.unwrap();
        assert!(count.is_empty());
    }

    #[tokio::test]
    async fn past_event_is_rejected() {
        let (checker, repos) = checker();
        let id = event(&repos, EventStatus::Published, 5, Utc::now() - Duration::hours(1)).await;
        let err = checker.admit(&id, "alice").await.unwrap_err();
        assert!(matches!(err, DomainError::EventInPast(_)));
    }

    #[tokio::test]
    async fn availability_is_checked_before_date() {
        let (checker, repos) = checker();
        let id = event(&repos, EventStatus::Draft, 5, Utc::now() - Duration::hours(1)).await;
        let err = checker.admit(&id, "alice").await.unwrap_err();
        assert!(matches!(err, DomainError::EventNotAvailable(_)));
    }

    #[tokio::test]
    async fn reaching_capacity_fills_the_event() {
        let (checker, repos) = checker();
        let id = event(&repos, EventStatus::Published, 1, next_week()).await;

        checker.admit(&id, "alice").await.unwrap();
        let err = checker.admit(&id, "bob").await.unwrap_err();
        assert!(matches!(err, DomainError::EventFull(_)));
    }

    #[tokio::test]
    async fn full_is_reported_before_duplicate() {
        let (checker, repos) = checker();
        let id = event(&repos, EventStatus::Published, 1, next_week()).await;

        checker.admit(&id, "alice").await.unwrap();
        let err = checker.admit(&id, "alice").await.unwrap_err();
        assert!(matches!(err, DomainError::EventFull(_)));
    }

    #[tokio::test]
    async fn duplicate_until_canceled() {
        let (checker, repos) = checker();
        let id = event(&repos, EventStatus::Published, 5, next_week()).await;

        let first = checker.admit(&id, "alice").await.unwrap();
        let err = checker.admit(&id, "alice").await.unwrap_err();
        assert!(matches!(err, DomainError::DuplicateReservation { .. }));

        repos
            .reservations()
            .update_status(&first.id, ReservationStatus::Canceled)
            .await
            .unwrap();
        let again = checker.admit(&id, "alice").await.unwrap();
        assert_ne!(again.id, first.id);
    }

    #[tokio::test]
    async fn refused_reservation_still_blocks_duplicate() {
        let (checker, repos) = checker();
        let id = event(&repos, EventStatus::Published, 5, next_week()).await;

        let first = checker.admit(&id, "alice").await.unwrap();
        repos
            .reservations()
            .update_status(&first.id, ReservationStatus::Refused)
            .await
            .unwrap();

        let err = checker.admit(&id, "alice").await.unwrap_err();
        assert!(matches!(err, DomainError::DuplicateReservation { .. }));
    }

    #[tokio::test]
    async fn refused_and_canceled_free_capacity() {
        let (checker, repos) = checker();
        let id = event(&repos, EventStatus::Published, 1, next_week()).await;

        let first = checker.admit(&id, "alice").await.unwrap();
        repos
            .reservations()
            .update_status(&first.id, ReservationStatus::Refused)
            .await
            .unwrap();
        checker.admit(&id, "bob").await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn concurrent_admissions_never_exceed_capacity() {
        let (checker, repos) = checker();
        let checker = Arc::new(checker);
        let id = event(&repos, EventStatus::Published, 5, next_week()).await;

        let mut tasks = Vec::new();
        for n in 0..50 {
            let checker = checker.clone();
            let id = id.clone();
            tasks.push(tokio::spawn(async move {
                checker.admit(&id, &format!("user-{n}")).await
            }));
        }

        let mut admitted = 0;
        let mut full = 0;
        for t in tasks {
            match t.await.unwrap() {
                Ok(_) => admitted += 1,
                Err(DomainError::EventFull(_)) => full += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(admitted, 5);
        assert_eq!(full, 45);
        let active = repos
            .reservations()
            .count_where(&id, &ReservationStatus::ACTIVE)
            .await
            .unwrap();
        assert_eq!(active, 5);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn concurrent_duplicates_admit_once() {
        let (checker, repos) = checker();
        let checker = Arc::new(checker);
        let id = event(&repos, EventStatus::Published, 10, next_week()).await;

        let mut tasks = Vec::new();
        for _ in 0..20 {
            let checker = checker.clone();
            let id = id.clone();
            tasks.push(tokio::spawn(async move { checker.admit(&id, "alice").await }));
        }

        let mut ok = 0;
        for t in tasks {
            if t.await.unwrap().is_ok() {
                ok += 1;
            }
        }
        assert_eq!(ok, 1);
    }
}
