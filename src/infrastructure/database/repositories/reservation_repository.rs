//! SeaORM implementation of ReservationRepository

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, SqlErr,
};
use tracing::debug;
use uuid::Uuid;

use crate::domain::{
    DomainError, DomainResult, NewReservation, Reservation, ReservationFilter,
    ReservationRepository, ReservationStatus,
};
use crate::infrastructure::database::entities::reservation;

pub struct SeaOrmReservationRepository {
    db: DatabaseConnection,
}

impl SeaOrmReservationRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn model_to_domain(m: reservation::Model) -> DomainResult<Reservation> {
    Ok(Reservation {
        status: m.status.parse::<ReservationStatus>()?,
        id: m.id,
        event_id: m.event_id,
        user_id: m.user_id,
        created_at: m.created_at,
        updated_at: m.updated_at,
    })
}

fn status_values(statuses: &[ReservationStatus]) -> Vec<&'static str> {
    statuses.iter().map(|s| s.as_str()).collect()
}

/// The open-pair index is the only unique constraint a reservation write can
/// hit besides the generated primary key.
fn map_write_err(e: DbErr, event_id: &str, user_id: &str) -> DomainError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => DomainError::DuplicateReservation {
            event_id: event_id.to_string(),
            user_id: user_id.to_string(),
        },
        _ => e.into(),
    }
}

// ── ReservationRepository impl ──────────────────────────────────

#[async_trait]
impl ReservationRepository for SeaOrmReservationRepository {
    async fn insert(&self, r: NewReservation) -> DomainResult<Reservation> {
        let now = Utc::now();
        let id = Uuid::new_v4().to_string();
        debug!("Inserting reservation: {}", id);

        let model = reservation::ActiveModel {
            id: Set(id),
            event_id: Set(r.event_id.clone()),
            user_id: Set(r.user_id.clone()),
            status: Set(r.status.as_str().to_string()),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let saved = model
            .insert(&self.db)
            .await
            .map_err(|e| map_write_err(e, &r.event_id, &r.user_id))?;
        model_to_domain(saved)
    }

    async fn get(&self, id: &str) -> DomainResult<Option<Reservation>> {
        reservation::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(model_to_domain)
            .transpose()
    }

    async fn count_where(
        &self,
        event_id: &str,
        statuses: &[ReservationStatus],
    ) -> DomainResult<u64> {
        let count = reservation::Entity::find()
            .filter(reservation::Column::EventId.eq(event_id))
            .filter(reservation::Column::Status.is_in(status_values(statuses)))
            .count(&self.db)
            .await?;
        Ok(count)
    }

    async fn find_one(
        &self,
        event_id: &str,
        user_id: &str,
        exclude: &[ReservationStatus],
    ) -> DomainResult<Option<Reservation>> {
        let mut query = reservation::Entity::find()
            .filter(reservation::Column::EventId.eq(event_id))
            .filter(reservation::Column::UserId.eq(user_id));
        if !exclude.is_empty() {
            query = query.filter(reservation::Column::Status.is_not_in(status_values(exclude)));
        }
        query
            .one(&self.db)
            .await?
            .map(model_to_domain)
            .transpose()
    }

    async fn list(&self, filter: ReservationFilter) -> DomainResult<Vec<Reservation>> {
        let mut query = reservation::Entity::find();
        if let Some(event_id) = filter.event_id {
            query = query.filter(reservation::Column::EventId.eq(event_id));
        }
        if let Some(user_id) = filter.user_id {
            query = query.filter(reservation::Column::UserId.eq(user_id));
        }
        query
            .order_by_desc(reservation::Column::CreatedAt)
            .all(&self.db)
            .await?
            .into_iter()
            .map(model_to_domain)
            .collect()
    }

    async fn update_status(
        &self,
        id: &str,
        status: ReservationStatus,
    ) -> DomainResult<Option<Reservation>> {
        let Some(existing) = reservation::Entity::find_by_id(id).one(&self.db).await? else {
            return Ok(None);
        };
        debug!("Updating reservation {} to {}", id, status);

        let event_id = existing.event_id.clone();
        let user_id = existing.user_id.clone();
        let mut active: reservation::ActiveModel = existing.into();
        active.status = Set(status.as_str().to_string());
        active.updated_at = Set(Utc::now());

        let updated = active
            .update(&self.db)
            .await
            .map_err(|e| map_write_err(e, &event_id, &user_id))?;
        model_to_domain(updated).map(Some)
    }

    async fn update_status_if(
        &self,
        id: &str,
        from: ReservationStatus,
        to: ReservationStatus,
    ) -> DomainResult<Option<Reservation>> {
        let Some(existing) = reservation::Entity::find_by_id(id).one(&self.db).await? else {
            return Ok(None);
        };
        if existing.status != from.as_str() {
            return Ok(None);
        }
        debug!("Updating reservation {} from {} to {}", id, from, to);

        let result = reservation::Entity::update_many()
            .col_expr(reservation::Column::Status, Expr::value(to.as_str()))
            .col_expr(reservation::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(reservation::Column::Id.eq(id))
            .filter(reservation::Column::Status.eq(from.as_str()))
            .exec(&self.db)
            .await
            .map_err(|e| map_write_err(e, &existing.event_id, &existing.user_id))?;
        if result.rows_affected == 0 {
            return Ok(None);
        }
        self.get(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        CreateUserDto, EventRepository, EventStatus, NewEvent, UserRepositoryInterface, UserRole,
    };
    use crate::infrastructure::database::repositories::event_repository::SeaOrmEventRepository;
    use crate::infrastructure::database::repositories::test_support::memory_db;
    use crate::infrastructure::database::repositories::user_repository::UserRepository;
    use chrono::Duration;

    struct Seeded {
        repo: SeaOrmReservationRepository,
        event_id: String,
        users: Vec<String>,
    }

    async fn seeded(user_count: usize) -> Seeded {
        let db = memory_db().await;
        let event_id = SeaOrmEventRepository::new(db.clone())
            .insert(NewEvent {
                title: "Conf".into(),
                description: String::new(),
                location: String::new(),
                date: Utc::now() + Duration::days(1),
                capacity: 3,
                status: EventStatus::Published,
                image: None,
            })
            .await
            .unwrap()
            .id;

        let users_repo = UserRepository::new(db.clone());
        let mut users = Vec::new();
        for n in 0..user_count {
            let user = users_repo
                .create_user(CreateUserDto {
                    full_name: format!("User {n}"),
                    email: format!("user{n}@example.com"),
                    password_hash: "hash".into(),
                    role: UserRole::Participant,
                })
                .await
                .unwrap();
            users.push(user.id);
        }

        Seeded {
            repo: SeaOrmReservationRepository::new(db),
            event_id,
            users,
        }
    }

    #[tokio::test]
    async fn counts_only_requested_statuses() {
        let s = seeded(3).await;
        let a = s.repo.insert(NewReservation::pending(&s.event_id, &s.users[0])).await.unwrap();
        let b = s.repo.insert(NewReservation::pending(&s.event_id, &s.users[1])).await.unwrap();
        s.repo.insert(NewReservation::pending(&s.event_id, &s.users[2])).await.unwrap();

        s.repo.update_status(&a.id, ReservationStatus::Confirmed).await.unwrap();
        s.repo.update_status(&b.id, ReservationStatus::Refused).await.unwrap();

        let active = s
            .repo
            .count_where(&s.event_id, &ReservationStatus::ACTIVE)
            .await
            .unwrap();
        assert_eq!(active, 2);
        assert_eq!(
            s.repo
                .count_where(&s.event_id, &[ReservationStatus::Refused])
                .await
                .unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn unique_index_rejects_second_open_reservation() {
        let s = seeded(1).await;
        let user = &s.users[0];
        let first = s.repo.insert(NewReservation::pending(&s.event_id, user)).await.unwrap();

        let err = s
            .repo
            .insert(NewReservation::pending(&s.event_id, user))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::DuplicateReservation { .. }));

        s.repo
            .update_status(&first.id, ReservationStatus::Canceled)
            .await
            .unwrap();
        s.repo.insert(NewReservation::pending(&s.event_id, user)).await.unwrap();
    }

    #[tokio::test]
    async fn find_one_skips_excluded_statuses() {
        let s = seeded(1).await;
        let user = &s.users[0];
        let r = s.repo.insert(NewReservation::pending(&s.event_id, user)).await.unwrap();
        s.repo.update_status(&r.id, ReservationStatus::Canceled).await.unwrap();

        assert!(s
            .repo
            .find_one(&s.event_id, user, &[ReservationStatus::Canceled])
            .await
            .unwrap()
            .is_none());
        assert!(s.repo.find_one(&s.event_id, user, &[]).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn list_filters_by_user_and_event() {
        let s = seeded(2).await;
        s.repo.insert(NewReservation::pending(&s.event_id, &s.users[0])).await.unwrap();
        s.repo.insert(NewReservation::pending(&s.event_id, &s.users[1])).await.unwrap();

        let mine = s.repo.list(ReservationFilter::by_user(&s.users[0])).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].user_id, s.users[0]);

        let all = s.repo.list(ReservationFilter::by_event(&s.event_id)).await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(s.repo.update_status("missing", ReservationStatus::Canceled).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn conditional_status_write_skips_a_moved_reservation() {
        let s = seeded(1).await;
        let r = s.repo.insert(NewReservation::pending(&s.event_id, &s.users[0])).await.unwrap();

        let canceled = s
            .repo
            .update_status_if(&r.id, ReservationStatus::Pending, ReservationStatus::Canceled)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(canceled.status, ReservationStatus::Canceled);

        assert!(s
            .repo
            .update_status_if(&r.id, ReservationStatus::Pending, ReservationStatus::Confirmed)
            .await
            .unwrap()
            .is_none());
        assert_eq!(
            s.repo.get(&r.id).await.unwrap().unwrap().status,
            ReservationStatus::Canceled
        );
    }
}
