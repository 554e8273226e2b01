//! Reservation lifecycle, queries and ticket export

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use super::locks::EventLocks;
use crate::application::tickets::{render_ticket, TicketData};
use crate::domain::{
    DomainError, DomainResult, Event, EventStatus, RepositoryProvider, Reservation,
    ReservationFilter, ReservationStatus, User,
};

/// Event fields shown alongside a reservation.
#[derive(Debug, Clone)]
pub struct EventSummary {
    pub id: String,
    pub title: String,
    pub date: chrono::DateTime<Utc>,
    pub location: String,
    pub status: EventStatus,
}

impl From<&Event> for EventSummary {
    fn from(e: &Event) -> Self {
        Self {
            id: e.id.clone(),
            title: e.title.clone(),
            date: e.date,
            location: e.location.clone(),
            status: e.status,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ParticipantSummary {
    pub id: String,
    pub full_name: String,
    pub email: String,
}

impl From<&User> for ParticipantSummary {
    fn from(u: &User) -> Self {
        Self {
            id: u.id.clone(),
            full_name: u.full_name.clone(),
            email: u.email.clone(),
        }
    }
}

/// A reservation with its event and participant, when they still exist.
#[derive(Debug, Clone)]
pub struct ReservationView {
    pub reservation: Reservation,
    pub event: Option<EventSummary>,
    pub participant: Option<ParticipantSummary>,
}

/// Rendered ticket ready to be served as a download.
#[derive(Debug, Clone)]
pub struct Ticket {
    pub filename: String,
    pub bytes: Vec<u8>,
}

pub struct ReservationService {
    repos: Arc<dyn RepositoryProvider>,
    locks: EventLocks,
}

impl ReservationService {
    pub fn new(repos: Arc<dyn RepositoryProvider>, locks: EventLocks) -> Self {
        Self { repos, locks }
    }

    async fn load(&self, id: &str) -> DomainResult<Reservation> {
        self.repos
            .reservations()
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Reservation", id))
    }

    async fn store_status(
        &self,
        current: &Reservation,
        status: ReservationStatus,
    ) -> DomainResult<Reservation> {
        // Only applies if nobody moved the reservation since `current` was read.
        let Some(updated) = self
            .repos
            .reservations()
            .update_status_if(&current.id, current.status, status)
            .await?
        else {
            let now = self.load(&current.id).await?;
            return Err(Self::invalid(now.status, status));
        };

        metrics::counter!("reservation_transitions_total", "to" => status.as_str()).increment(1);
        info!(
            reservation_id = %updated.id,
            from = %current.status,
            to = %status,
            "Reservation status changed"
        );
        Ok(updated)
    }

    fn invalid(from: ReservationStatus, to: ReservationStatus) -> DomainError {
        DomainError::InvalidTransition {
            entity: "Reservation",
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    // ── Lifecycle ───────────────────────────────────────────────

    /// Administrative decision: `confirmed` or `refused`.
    ///
    /// Accepted from any non-canceled state. Confirming a reservation that
    /// does not currently hold a place re-checks capacity under the event
    /// lock.
    pub async fn set_status(
        &self,
        id: &str,
        status: ReservationStatus,
    ) -> DomainResult<Reservation> {
        if !status.is_admin_decision() {
            return Err(DomainError::Validation(format!(
                "Status must be 'confirmed' or 'refused', got '{}'",
                status
            )));
        }

        let current = self.load(id).await?;
        if !current.status.can_decide() {
            return Err(Self::invalid(current.status, status));
        }

        if status == ReservationStatus::Confirmed && !current.status.is_active() {
            let _guard = self.locks.acquire(&current.event_id).await;

            // Re-read under the lock.
            let current = self.load(id).await?;
            if !current.status.can_decide() {
                return Err(Self::invalid(current.status, status));
            }
            if !current.status.is_active() {
                self.ensure_place_left(&current.event_id).await?;
            }
            return self.store_status(&current, status).await;
        }

        self.store_status(&current, status).await
    }

    async fn ensure_place_left(&self, event_id: &str) -> DomainResult<()> {
        let event = self
            .repos
            .events()
            .get(event_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Event", event_id))?;
        let active = self
            .repos
            .reservations()
            .count_where(event_id, &ReservationStatus::ACTIVE)
            .await?;
        if active >= u64::from(event.capacity) {
            return Err(DomainError::EventFull(event.id));
        }
        Ok(())
    }

    /// Cancel on behalf of the participant who made the reservation.
    pub async fn cancel_by_owner(&self, id: &str, user_id: &str) -> DomainResult<Reservation> {
        let current = self.load(id).await?;
        if !current.is_owned_by(user_id) {
            return Err(DomainError::Forbidden(
                "Only the owner can cancel this reservation".into(),
            ));
        }
        if !current.status.can_cancel() {
            return Err(Self::invalid(current.status, ReservationStatus::Canceled));
        }
        self.store_status(&current, ReservationStatus::Canceled).await
    }

    pub async fn cancel_by_admin(&self, id: &str) -> DomainResult<Reservation> {
        let current = self.load(id).await?;
        if !current.status.can_cancel() {
            return Err(Self::invalid(current.status, ReservationStatus::Canceled));
        }
        self.store_status(&current, ReservationStatus::Canceled).await
    }

    // ── Queries ─────────────────────────────────────────────────

    pub async fn get(&self, id: &str) -> DomainResult<ReservationView> {
        let reservation = self.load(id).await?;
        self.view(reservation).await
    }

    pub async fn list(&self) -> DomainResult<Vec<ReservationView>> {
        self.list_views(ReservationFilter::default()).await
    }

    pub async fn list_for_user(&self, user_id: &str) -> DomainResult<Vec<ReservationView>> {
        self.list_views(ReservationFilter::by_user(user_id)).await
    }

    pub async fn list_for_event(&self, event_id: &str) -> DomainResult<Vec<ReservationView>> {
        if self.repos.events().get(event_id).await?.is_none() {
            return Err(DomainError::not_found("Event", event_id));
        }
        self.list_views(ReservationFilter::by_event(event_id)).await
    }

    async fn list_views(&self, filter: ReservationFilter) -> DomainResult<Vec<ReservationView>> {
        let reservations = self.repos.reservations().list(filter).await?;
        let mut views = Vec::with_capacity(reservations.len());
        for r in reservations {
            views.push(self.view(r).await?);
        }
        Ok(views)
    }

    async fn view(&self, reservation: Reservation) -> DomainResult<ReservationView> {
        let event = self.repos.events().get(&reservation.event_id).await?;
        let user = self.repos.users().get_user_by_id(&reservation.user_id).await?;
        Ok(ReservationView {
            event: event.as_ref().map(EventSummary::from),
            participant: user.as_ref().map(ParticipantSummary::from),
            reservation,
        })
    }

    // ── Ticket ──────────────────────────────────────────────────

    /// PDF ticket for the owner of a confirmed reservation.
    pub async fn ticket(&self, id: &str, user_id: &str) -> DomainResult<Ticket> {
        let reservation = self.load(id).await?;
        if !reservation.is_owned_by(user_id) {
            return Err(DomainError::Forbidden(
                "Only the owner can download this ticket".into(),
            ));
        }
        if reservation.status != ReservationStatus::Confirmed {
            return Err(DomainError::TicketUnavailable(format!(
                "reservation {} is {}",
                reservation.id, reservation.status
            )));
        }

        let event = self
            .repos
            .events()
            .get(&reservation.event_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Event", reservation.event_id.as_str()))?;
        let user = self
            .repos
            .users()
            .get_user_by_id(&reservation.user_id)
            .await?
            .ok_or_else(|| DomainError::not_found("User", reservation.user_id.as_str()))?;

        let data = TicketData {
            ticket_number: reservation.id.clone(),
            status: reservation.status.to_string(),
            event_title: event.title,
            event_date: event.date.format("%Y-%m-%d %H:%M UTC").to_string(),
            event_location: event.location,
            participant_name: user.full_name,
            participant_email: user.email,
            issued_at: Utc::now().format("%Y-%m-%d %H:%M UTC").to_string(),
        };

        Ok(Ticket {
            filename: format!("ticket-{}.pdf", reservation.id),
            bytes: render_ticket(&data),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::reservations::AdmissionChecker;
    use crate::domain::{CreateUserDto, NewEvent, UserRole};
    use crate::infrastructure::storage::InMemoryRepositoryProvider;
    use chrono::Duration;

    struct Fixture {
        repos: Arc<dyn RepositoryProvider>,
        admission: AdmissionChecker,
        service: ReservationService,
        event_id: String,
    }

    async fn fixture(capacity: u32) -> Fixture {
        let repos: Arc<dyn RepositoryProvider> = Arc::new(InMemoryRepositoryProvider::new());
        let locks = EventLocks::new();
        let event_id = repos
            .events()
            .insert(NewEvent {
                title: "Workshop".into(),
                description: String::new(),
                location: "Room 4".into(),
                date: Utc::now() + Duration::days(3),
                capacity,
                status: EventStatus::Published,
                image: None,
            })
            .await
            .unwrap()
            .id;
        Fixture {
            admission: AdmissionChecker::new(repos.clone(), locks.clone()),
            service: ReservationService::new(repos.clone(), locks),
            repos,
            event_id,
        }
    }

    async fn participant(repos: &Arc<dyn RepositoryProvider>, email: &str) -> String {
        repos
            .users()
            .create_user(CreateUserDto {
                full_name: "Grace Hopper".into(),
                email: email.into(),
                password_hash: "hash".into(),
                role: UserRole::Participant,
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn admin_confirms_pending_reservation() {
        let f = fixture(2).await;
        let r = f.admission.admit(&f.event_id, "alice").await.unwrap();

        let confirmed = f
            .service
            .set_status(&r.id, ReservationStatus::Confirmed)
            .await
            .unwrap();
        assert_eq!(confirmed.status, ReservationStatus::Confirmed);
    }

    #[tokio::test]
    async fn only_confirm_or_refuse_are_accepted() {
        let f = fixture(2).await;
        let r = f.admission.admit(&f.event_id, "alice").await.unwrap();
        for status in [ReservationStatus::Pending, ReservationStatus::Canceled] {
            let err = f.service.set_status(&r.id, status).await.unwrap_err();
            assert!(matches!(err, DomainError::Validation(_)));
        }
    }

    #[tokio::test]
    async fn refused_can_be_reconfirmed_while_places_remain() {
        let f = fixture(1).await;
        let r = f.admission.admit(&f.event_id, "alice").await.unwrap();
        f.service
            .set_status(&r.id, ReservationStatus::Refused)
            .await
            .unwrap();

        let again = f
            .service
            .set_status(&r.id, ReservationStatus::Confirmed)
            .await
            .unwrap();
        assert_eq!(again.status, ReservationStatus::Confirmed);
    }

    #[tokio::test]
    async fn reconfirming_refused_respects_capacity() {
        let f = fixture(1).await;
        let r = f.admission.admit(&f.event_id, "alice").await.unwrap();
        f.service
            .set_status(&r.id, ReservationStatus::Refused)
            .await
            .unwrap();
        f.admission.admit(&f.event_id, "bob").await.unwrap();

        let err = f
            .service
            .set_status(&r.id, ReservationStatus::Confirmed)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::EventFull(_)));
    }

    #[tokio::test]
    async fn canceled_reservation_cannot_be_decided_or_recanceled() {
        let f = fixture(2).await;
        let r = f.admission.admit(&f.event_id, "alice").await.unwrap();
        f.service.cancel_by_admin(&r.id).await.unwrap();

        let err = f
            .service
            .set_status(&r.id, ReservationStatus::Confirmed)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidTransition { .. }));

        assert!(matches!(
            f.service.cancel_by_admin(&r.id).await,
            Err(DomainError::InvalidTransition { .. })
        ));
        assert!(matches!(
            f.service.cancel_by_owner(&r.id, "alice").await,
            Err(DomainError::InvalidTransition { .. })
        ));
    }

    #[tokio::test]
    async fn only_owner_may_cancel() {
        let f = fixture(2).await;
        let r = f.admission.admit(&f.event_id, "alice").await.unwrap();

        let err = f.service.cancel_by_owner(&r.id, "mallory").await.unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));

        let canceled = f.service.cancel_by_owner(&r.id, "alice").await.unwrap();
        assert_eq!(canceled.status, ReservationStatus::Canceled);
    }

    #[tokio::test]
    async fn unknown_reservation_is_not_found() {
        let f = fixture(1).await;
        assert!(matches!(
            f.service.cancel_by_admin("nope").await,
            Err(DomainError::NotFound { .. })
        ));
        assert!(matches!(
            f.service.set_status("nope", ReservationStatus::Refused).await,
            Err(DomainError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn listings_embed_event_summary() {
        let f = fixture(3).await;
        let alice = participant(&f.repos, "alice@example.com").await;
        f.admission.admit(&f.event_id, &alice).await.unwrap();
        f.admission.admit(&f.event_id, "bob").await.unwrap();

        let mine = f.service.list_for_user(&alice).await.unwrap();
        assert_eq!(mine.len(), 1);
        let view = &mine[0];
        assert_eq!(view.event.as_ref().unwrap().title, "Workshop");
        assert_eq!(view.participant.as_ref().unwrap().email, "alice@example.com");

        assert_eq!(f.service.list_for_event(&f.event_id).await.unwrap().len(), 2);
        assert_eq!(f.service.list().await.unwrap().len(), 2);
        assert!(matches!(
            f.service.list_for_event("missing").await,
            Err(DomainError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn ticket_requires_confirmed_reservation_and_owner() {
        let f = fixture(2).await;
        let alice = participant(&f.repos, "alice@example.com").await;
        let r = f.admission.admit(&f.event_id, &alice).await.unwrap();

        let err = f.service.ticket(&r.id, &alice).await.unwrap_err();
        assert!(matches!(err, DomainError::TicketUnavailable(_)));

        f.service
            .set_status(&r.id, ReservationStatus::Confirmed)
            .await
            .unwrap();

        let err = f.service.ticket(&r.id, "bob").await.unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));

        let ticket = f.service.ticket(&r.id, &alice).await.unwrap();
        assert!(!ticket.bytes.is_empty());
        assert!(ticket.bytes.starts_with(b"%PDF"));
        assert_eq!(ticket.filename, format!("ticket-{}.pdf", r.id));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn concurrent_cancels_apply_once() {
        use crate::infrastructure::database::repositories::test_support::memory_db;
        use crate::infrastructure::SeaOrmRepositoryProvider;

        let repos: Arc<dyn RepositoryProvider> =
            Arc::new(SeaOrmRepositoryProvider::new(memory_db().await));
        let locks = EventLocks::new();
        let admission = AdmissionChecker::new(repos.clone(), locks.clone());
        let service = Arc::new(ReservationService::new(repos.clone(), locks));
        let event_id = repos
            .events()
            .insert(NewEvent {
                title: "Workshop".into(),
                description: String::new(),
                location: "Room 4".into(),
                date: Utc::now() + Duration::days(3),
                capacity: 50,
                status: EventStatus::Published,
                image: None,
            })
            .await
            .unwrap()
            .id;

        for n in 0..20 {
            let user = participant(&repos, &format!("user{n}@example.com")).await;
            let id = admission.admit(&event_id, &user).await.unwrap().id;

            let (by_owner, by_admin) = tokio::join!(
                tokio::spawn({
                    let (service, id, user) = (service.clone(), id.clone(), user.clone());
                    async move { service.cancel_by_owner(&id, &user).await }
                }),
                tokio::spawn({
                    let (service, id) = (service.clone(), id.clone());
                    async move { service.cancel_by_admin(&id).await }
                }),
            );

            let mut applied = 0;
            for result in [by_owner.unwrap(), by_admin.unwrap()] {
                match result {
                    Ok(r) => {
                        assert_eq!(r.status, ReservationStatus::Canceled);
                        applied += 1;
                    }
                    Err(DomainError::InvalidTransition { entity: "Reservation", .. }) => {}
                    Err(other) => panic!("unexpected error: {other}"),
                }
            }
            assert_eq!(applied, 1);
        }
    }
}
