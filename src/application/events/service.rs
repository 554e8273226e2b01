//! Event management and lifecycle
//!
//! Publish and cancel are the only status transitions exposed here. Field
//! edits are plain updates that never touch the status.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::domain::{
    DomainError, DomainResult, Event, EventFilter, EventPatch, EventStatus, NewEvent,
    RepositoryProvider,
};

pub struct EventService {
    repos: Arc<dyn RepositoryProvider>,
}

impl EventService {
    pub fn new(repos: Arc<dyn RepositoryProvider>) -> Self {
        Self { repos }
    }

    pub async fn create(&self, new: NewEvent) -> DomainResult<Event> {
        new.validate()?;
        if new.status != EventStatus::Draft {
            return Err(DomainError::Validation(
                "New events start as draft".into(),
            ));
        }
        let event = self.repos.events().insert(new).await?;
        info!(event_id = %event.id, title = %event.title, "Event created");
        Ok(event)
    }

    pub async fn get(&self, id: &str) -> DomainResult<Event> {
        self.repos
            .events()
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Event", id))
    }

    pub async fn list(&self, filter: EventFilter) -> DomainResult<Vec<Event>> {
        self.repos.events().list(filter).await
    }

    /// Published events, optionally within a date window.
    pub async fn list_published(
        &self,
        date_from: Option<DateTime<Utc>>,
        date_to: Option<DateTime<Utc>>,
    ) -> DomainResult<Vec<Event>> {
        self.repos
            .events()
            .list(EventFilter {
                status: Some(EventStatus::Published),
                date_from,
                date_to,
            })
            .await
    }

    /// Edit event fields. Status changes go through [`publish`](Self::publish)
    /// and [`cancel`](Self::cancel).
    pub async fn update(&self, id: &str, mut patch: EventPatch) -> DomainResult<Event> {
        patch.status = None;
        patch.validate()?;
        let event = self
            .repos
            .events()
            .update(id, patch)
            .await?
            .ok_or_else(|| DomainError::not_found("Event", id))?;
        info!(event_id = %event.id, "Event updated");
        Ok(event)
    }

    pub async fn publish(&self, id: &str) -> DomainResult<Event> {
        self.transition(id, EventStatus::Published, EventStatus::can_publish)
            .await
    }

    /// Cancel the event. Its reservations are left untouched.
    pub async fn cancel(&self, id: &str) -> DomainResult<Event> {
        self.transition(id, EventStatus::Canceled, EventStatus::can_cancel)
            .await
    }

    async fn transition(
        &self,
        id: &str,
        to: EventStatus,
        allowed: fn(&EventStatus) -> bool,
    ) -> DomainResult<Event> {
        let event = self.get(id).await?;
        if !allowed(&event.status) {
            return Err(Self::invalid(event.status, to));
        }

        // Conditional on the status just read, so concurrent callers cannot
        // both apply the same transition.
        let Some(updated) = self
            .repos
            .events()
            .update_status_if(id, event.status, to)
            .await?
        else {
            let current = self.get(id).await?;
            return Err(Self::invalid(current.status, to));
        };

        metrics::counter!("event_transitions_total", "transition" => to.as_str()).increment(1);
        info!(event_id = %id, from = %event.status, to = %to, "Event status changed");
        Ok(updated)
    }

    fn invalid(from: EventStatus, to: EventStatus) -> DomainError {
        DomainError::InvalidTransition {
            entity: "Event",
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    pub async fn delete(&self, id: &str) -> DomainResult<()> {
        if !self.repos.events().delete(id).await? {
            return Err(DomainError::not_found("Event", id));
        }
        info!(event_id = %id, "Event deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::storage::InMemoryRepositoryProvider;
    use chrono::Duration;

    fn service() -> EventService {
        EventService::new(Arc::new(InMemoryRepositoryProvider::new()))
    }

    fn draft(title: &str, days: i64) -> NewEvent {
        NewEvent {
            title: title.into(),
            description: "An evening of talks".into(),
            location: "Main hall".into(),
            date: Utc::now() + Duration::days(days),
            capacity: 30,
            status: EventStatus::Draft,
            image: Some("uploads/cover.png".into()),
        }
    }

    #[tokio::test]
    async fn created_event_round_trips() {
        let svc = service();
        let new = draft("Launch", 5);
        let created = svc.create(new.clone()).await.unwrap();
        let fetched = svc.get(&created.id).await.unwrap();

        assert_eq!(fetched.title, new.title);
        assert_eq!(fetched.description, new.description);
        assert_eq!(fetched.location, new.location);
        assert_eq!(fetched.date, new.date);
        assert_eq!(fetched.capacity, new.capacity);
        assert_eq!(fetched.status, EventStatus::Draft);
        assert_eq!(fetched.image, new.image);
    }

    #[tokio::test]
    async fn publish_only_from_draft() {
        let svc = service();
        let e = svc.create(draft("Launch", 5)).await.unwrap();

        let published = svc.publish(&e.id).await.unwrap();
        assert_eq!(published.status, EventStatus::Published);

        let err = svc.publish(&e.id).await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidTransition { entity: "Event", .. }));
    }

    #[tokio::test]
    async fn cancel_is_rejected_once_canceled() {
        let svc = service();
        let e = svc.create(draft("Launch", 5)).await.unwrap();
        svc.publish(&e.id).await.unwrap();

        assert_eq!(svc.cancel(&e.id).await.unwrap().status, EventStatus::Canceled);
        assert!(matches!(
            svc.cancel(&e.id).await,
            Err(DomainError::InvalidTransition { .. })
        ));
        assert!(matches!(
            svc.publish(&e.id).await,
            Err(DomainError::InvalidTransition { .. })
        ));
    }

    #[tokio::test]
    async fn draft_can_be_canceled_directly() {
        let svc = service();
        let e = svc.create(draft("Launch", 5)).await.unwrap();
        assert_eq!(svc.cancel(&e.id).await.unwrap().status, EventStatus::Canceled);
    }

    #[tokio::test]
    async fn missing_event_is_not_found() {
        let svc = service();
        assert!(matches!(svc.publish("x").await, Err(DomainError::NotFound { .. })));
        assert!(matches!(svc.cancel("x").await, Err(DomainError::NotFound { .. })));
        assert!(matches!(svc.delete("x").await, Err(DomainError::NotFound { .. })));
        assert!(matches!(
            svc.update("x", EventPatch::default()).await,
            Err(DomainError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn update_ignores_status_and_validates_capacity() {
        let svc = service();
        let e = svc.create(draft("Launch", 5)).await.unwrap();

        let updated = svc
            .update(
                &e.id,
                EventPatch {
                    capacity: Some(12),
                    status: Some(EventStatus::Published),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.capacity, 12);
        assert_eq!(updated.status, EventStatus::Draft);

        let err = svc
            .update(
                &e.id,
                EventPatch {
                    capacity: Some(0),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn published_listing_respects_status_and_window() {
        let svc = service();
        let soon = svc.create(draft("Soon", 2)).await.unwrap();
        let later = svc.create(draft("Later", 20)).await.unwrap();
        svc.create(draft("Hidden", 3)).await.unwrap();
        svc.publish(&soon.id).await.unwrap();
        svc.publish(&later.id).await.unwrap();

        let all = svc.list_published(None, None).await.unwrap();
        let titles: Vec<_> = all.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, ["Soon", "Later"]);

        let window = svc
            .list_published(None, Some(Utc::now() + Duration::days(10)))
            .await
            .unwrap();
        assert_eq!(window.len(), 1);
        assert_eq!(window[0].id, soon.id);
    }

    #[tokio::test]
    async fn delete_removes_event() {
        let svc = service();
        let e = svc.create(draft("Launch", 5)).await.unwrap();
        svc.delete(&e.id).await.unwrap();
        assert!(matches!(svc.get(&e.id).await, Err(DomainError::NotFound { .. })));
    }

    fn assert_single_winner(results: Vec<DomainResult<Event>>) {
        let mut applied = 0;
        let mut rejected = 0;
        for result in results {
            match result {
                Ok(_) => applied += 1,
                Err(DomainError::InvalidTransition { entity: "Event", .. }) => rejected += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        assert_eq!((applied, rejected), (1, 1));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn concurrent_publish_and_cancel_apply_once() {
        use crate::infrastructure::database::repositories::test_support::memory_db;
        use crate::infrastructure::SeaOrmRepositoryProvider;

        let svc = Arc::new(EventService::new(Arc::new(SeaOrmRepositoryProvider::new(
            memory_db().await,
        ))));

        for _ in 0..20 {
            let id = svc.create(draft("Launch", 5)).await.unwrap().id;

            let (a, b) = tokio::join!(
                tokio::spawn({
                    let (svc, id) = (svc.clone(), id.clone());
                    async move { svc.publish(&id).await }
                }),
                tokio::spawn({
                    let (svc, id) = (svc.clone(), id.clone());
                    async move { svc.publish(&id).await }
                }),
            );
            assert_single_winner(vec![a.unwrap(), b.unwrap()]);

            let (a, b) = tokio::join!(
                tokio::spawn({
                    let (svc, id) = (svc.clone(), id.clone());
                    async move { svc.cancel(&id).await }
                }),
                tokio::spawn({
                    let (svc, id) = (svc.clone(), id.clone());
                    async move { svc.cancel(&id).await }
                }),
            );
            assert_single_winner(vec![a.unwrap(), b.unwrap()]);
            assert_eq!(svc.get(&id).await.unwrap().status, EventStatus::Canceled);
        }
    }
}
