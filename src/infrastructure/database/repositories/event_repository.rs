//! SeaORM implementation of EventRepository

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use tracing::debug;
use uuid::Uuid;

use crate::domain::{
    DomainError, DomainResult, Event, EventFilter, EventPatch, EventRepository, EventStatus,
    NewEvent,
};
use crate::infrastructure::database::entities::event;

pub struct SeaOrmEventRepository {
    db: DatabaseConnection,
}

impl SeaOrmEventRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn model_to_domain(m: event::Model) -> DomainResult<Event> {
    Ok(Event {
        status: m.status.parse::<EventStatus>()?,
        capacity: u32::try_from(m.capacity)
            .map_err(|_| DomainError::Storage(format!("Event {} has invalid capacity", m.id)))?,
        id: m.id,
        title: m.title,
        description: m.description,
        location: m.location,
        date: m.date,
        image: m.image,
        created_at: m.created_at,
        updated_at: m.updated_at,
    })
}

fn capacity_col(capacity: u32) -> DomainResult<i32> {
    i32::try_from(capacity).map_err(|_| DomainError::Validation("Capacity is too large".into()))
}

// ── EventRepository impl ────────────────────────────────────────

#[async_trait]
impl EventRepository for SeaOrmEventRepository {
    async fn insert(&self, e: NewEvent) -> DomainResult<Event> {
        let now = Utc::now();
        let id = Uuid::new_v4().to_string();
        debug!("Inserting event: {}", id);

        let model = event::ActiveModel {
            id: Set(id),
            title: Set(e.title),
            description: Set(e.description),
            location: Set(e.location),
            date: Set(e.date),
            capacity: Set(capacity_col(e.capacity)?),
            status: Set(e.status.as_str().to_string()),
            image: Set(e.image),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let saved = model.insert(&self.db).await?;
        model_to_domain(saved)
    }

    async fn get(&self, id: &str) -> DomainResult<Option<Event>> {
        event::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(model_to_domain)
            .transpose()
    }

    async fn list(&self, filter: EventFilter) -> DomainResult<Vec<Event>> {
        let mut query = event::Entity::find();
        if let Some(status) = filter.status {
            query = query.filter(event::Column::Status.eq(status.as_str()));
        }
        if let Some(from) = filter.date_from {
            query = query.filter(event::Column::Date.gte(from));
        }
        if let Some(to) = filter.date_to {
            query = query.filter(event::Column::Date.lte(to));
        }

        query
            .order_by_asc(event::Column::Date)
            .all(&self.db)
            .await?
            .into_iter()
            .map(model_to_domain)
            .collect()
    }

    async fn update(&self, id: &str, patch: EventPatch) -> DomainResult<Option<Event>> {
        let Some(existing) = event::Entity::find_by_id(id).one(&self.db).await? else {
            return Ok(None);
        };

        let mut active: event::ActiveModel = existing.into();
        if let Some(v) = patch.title {
            active.title = Set(v);
        }
        if let Some(v) = patch.description {
            active.description = Set(v);
        }
        if let Some(v) = patch.location {
            active.location = Set(v);
        }
        if let Some(v) = patch.date {
            active.date = Set(v);
        }
        if let Some(v) = patch.capacity {
            active.capacity = Set(capacity_col(v)?);
        }
        if let Some(v) = patch.status {
            active.status = Set(v.as_str().to_string());
        }
        if let Some(v) = patch.image {
            active.image = Set(Some(v));
        }
        active.updated_at = Set(Utc::now());

        let updated = active.update(&self.db).await?;
        model_to_domain(updated).map(Some)
    }

    async fn update_status_if(
        &self,
        id: &str,
        from: EventStatus,
        to: EventStatus,
    ) -> DomainResult<Option<Event>> {
        debug!("Updating event {} from {} to {}", id, from, to);
        let result = event::Entity::update_many()
            .col_expr(event::Column::Status, Expr::value(to.as_str()))
            .col_expr(event::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(event::Column::Id.eq(id))
            .filter(event::Column::Status.eq(from.as_str()))
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Ok(None);
        }
        self.get(id).await
    }

    async fn delete(&self, id: &str) -> DomainResult<bool> {
        let result = event::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(result.rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::database::repositories::test_support::memory_db;
    use chrono::{Duration, SubsecRound};

    fn new_event(title: &str, days: i64, status: EventStatus) -> NewEvent {
        NewEvent {
            title: title.into(),
            description: "desc".into(),
            location: "Hall".into(),
            date: (Utc::now() + Duration::days(days)).trunc_subsecs(0),
            capacity: 10,
            status,
            image: None,
        }
    }

    #[tokio::test]
    async fn insert_and_get_round_trip() {
        let repo = SeaOrmEventRepository::new(memory_db().await);
        let new = new_event("Conf", 3, EventStatus::Draft);
        let created = repo.insert(new.clone()).await.unwrap();

        let fetched = repo.get(&created.id).await.unwrap().unwrap();
        assert_eq!(fetched.title, new.title);
        assert_eq!(fetched.date, new.date);
        assert_eq!(fetched.capacity, 10);
        assert_eq!(fetched.status, EventStatus::Draft);
        assert!(repo.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_filters_and_orders_by_date() {
        let repo = SeaOrmEventRepository::new(memory_db().await);
        repo.insert(new_event("Late", 9, EventStatus::Published)).await.unwrap();
        repo.insert(new_event("Early", 1, EventStatus::Published)).await.unwrap();
        repo.insert(new_event("Draft", 2, EventStatus::Draft)).await.unwrap();

        let published = repo
            .list(EventFilter {
                status: Some(EventStatus::Published),
                ..Default::default()
            })
            .await
            .unwrap();
        let titles: Vec<_> = published.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, ["Early", "Late"]);

        let window = repo
            .list(EventFilter {
                date_to: Some(Utc::now() + Duration::days(5)),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(window.len(), 2);
    }

    #[tokio::test]
    async fn update_and_delete() {
        let repo = SeaOrmEventRepository::new(memory_db().await);
        let e = repo.insert(new_event("Conf", 3, EventStatus::Draft)).await.unwrap();

        let updated = repo
            .update(&e.id, EventPatch::status(EventStatus::Published))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.status, EventStatus::Published);
        assert_eq!(updated.title, "Conf");
        assert!(repo.update("missing", EventPatch::default()).await.unwrap().is_none());

        assert!(repo.delete(&e.id).await.unwrap());
        assert!(!repo.delete(&e.id).await.unwrap());
    }

    #[tokio::test]
    async fn conditional_status_write_requires_the_expected_status() {
        let repo = SeaOrmEventRepository::new(memory_db().await);
        let e = repo.insert(new_event("Conf", 3, EventStatus::Draft)).await.unwrap();

        let published = repo
            .update_status_if(&e.id, EventStatus::Draft, EventStatus::Published)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(published.status, EventStatus::Published);

        // A second writer that still believes the event is a draft loses.
        assert!(repo
            .update_status_if(&e.id, EventStatus::Draft, EventStatus::Published)
            .await
            .unwrap()
            .is_none());
        assert!(repo
            .update_status_if("missing", EventStatus::Draft, EventStatus::Published)
            .await
            .unwrap()
            .is_none());
        assert_eq!(
            repo.get(&e.id).await.unwrap().unwrap().status,
            EventStatus::Published
        );
    }
}
