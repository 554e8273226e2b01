//! Event store interface

use async_trait::async_trait;

use super::model::{Event, EventFilter, EventPatch, EventStatus, NewEvent};
use crate::domain::DomainResult;

#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Persist a new event and return it with its generated id
    async fn insert(&self, event: NewEvent) -> DomainResult<Event>;

    /// Find event by ID
    async fn get(&self, id: &str) -> DomainResult<Option<Event>>;

    /// List events matching the filter, ordered by date ascending
    async fn list(&self, filter: EventFilter) -> DomainResult<Vec<Event>>;

    /// Apply a partial update; `None` when the event does not exist
    async fn update(&self, id: &str, patch: EventPatch) -> DomainResult<Option<Event>>;

    /// Move the event from `from` to `to` in a single conditional write.
    ///
    /// `None` when the event does not exist or its status is no longer `from`.
    async fn update_status_if(
        &self,
        id: &str,
        from: EventStatus,
        to: EventStatus,
    ) -> DomainResult<Option<Event>>;

    /// Delete an event; `false` when it did not exist
    async fn delete(&self, id: &str) -> DomainResult<bool>;
}
