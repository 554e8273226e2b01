use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr,
};
use uuid::Uuid;

use crate::domain::{
    CreateUserDto, DomainError, DomainResult, GetUserDto, UpdateUserDto, User,
    UserRepositoryInterface, UserRole,
};
use crate::infrastructure::database::entities::user;
use crate::shared::{validate_pagination, PaginatedResult};

pub struct UserRepository {
    db: DatabaseConnection,
}

impl UserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn entity_role_to_domain(role: user::UserRole) -> UserRole {
    match role {
        user::UserRole::Admin => UserRole::Admin,
        user::UserRole::Participant => UserRole::Participant,
    }
}

fn domain_role_to_entity(role: UserRole) -> user::UserRole {
    match role {
        UserRole::Admin => user::UserRole::Admin,
        UserRole::Participant => user::UserRole::Participant,
    }
}

fn user_model_to_domain(model: user::Model) -> User {
    User {
        id: model.id,
        full_name: model.full_name,
        email: model.email,
        password_hash: model.password_hash,
        role: entity_role_to_domain(model.role),
        is_active: model.is_active,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

fn map_write_err(e: DbErr) -> DomainError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            DomainError::Conflict("Email already exists".to_string())
        }
        _ => e.into(),
    }
}

// ── Repository implementation ───────────────────────────────────

#[async_trait]
impl UserRepositoryInterface for UserRepository {
    async fn create_user(&self, dto: CreateUserDto) -> DomainResult<User> {
        let now = Utc::now();

        let new_user = user::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            full_name: Set(dto.full_name),
            email: Set(dto.email),
            password_hash: Set(dto.password_hash),
            role: Set(domain_role_to_entity(dto.role)),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let saved = new_user.insert(&self.db).await.map_err(map_write_err)?;
        Ok(user_model_to_domain(saved))
    }

    async fn list_users(&self, dto: GetUserDto) -> DomainResult<PaginatedResult<User>> {
        let (page, page_size) = validate_pagination(dto.page, dto.page_size);

        let mut query = user::Entity::find();

        if let Some(search) = dto.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            query = query.filter(
                Condition::any()
                    .add(user::Column::FullName.contains(search))
                    .add(user::Column::Email.contains(search)),
            );
        }

        if let Some(role) = dto.role {
            query = query.filter(user::Column::Role.eq(domain_role_to_entity(role)));
        }

        query = query.order_by_desc(user::Column::CreatedAt);

        let total = query.clone().count(&self.db).await?;

        let offset = ((page - 1) * page_size) as u64;
        let models = query
            .offset(offset)
            .limit(page_size as u64)
            .all(&self.db)
            .await?;

        let items: Vec<User> = models.into_iter().map(user_model_to_domain).collect();

        Ok(PaginatedResult::new(items, total, page, page_size))
    }

    async fn get_user_by_id(&self, id: &str) -> DomainResult<Option<User>> {
        let model = user::Entity::find_by_id(id).one(&self.db).await?;
        Ok(model.map(user_model_to_domain))
    }

    async fn get_user_by_email(&self, email: &str) -> DomainResult<Option<User>> {
        let model = user::Entity::find()
            .filter(user::Column::Email.eq(email.to_lowercase()))
            .one(&self.db)
            .await?;
        Ok(model.map(user_model_to_domain))
    }

    async fn count_users(&self) -> DomainResult<u64> {
        Ok(user::Entity::find().count(&self.db).await?)
    }

    async fn update_user(&self, id: &str, dto: UpdateUserDto) -> DomainResult<Option<User>> {
        let Some(existing) = user::Entity::find_by_id(id).one(&self.db).await? else {
            return Ok(None);
        };

        let mut active: user::ActiveModel = existing.into();

        if let Some(full_name) = dto.full_name {
            active.full_name = Set(full_name);
        }
        if let Some(email) = dto.email {
            active.email = Set(email);
        }
        if let Some(hash) = dto.password_hash {
            active.password_hash = Set(hash);
        }
        if let Some(role) = dto.role {
            active.role = Set(domain_role_to_entity(role));
        }
        if let Some(is_active) = dto.is_active {
            active.is_active = Set(is_active);
        }

        active.updated_at = Set(Utc::now());

        let updated = active.update(&self.db).await.map_err(map_write_err)?;
        Ok(Some(user_model_to_domain(updated)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::database::repositories::test_support::memory_db;

    fn dto(name: &str, email: &str, role: UserRole) -> CreateUserDto {
        CreateUserDto {
            full_name: name.into(),
            email: email.into(),
            password_hash: "hash".into(),
            role,
        }
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let repo = UserRepository::new(memory_db().await);
        repo.create_user(dto("Ada", "ada@example.com", UserRole::Admin))
            .await
            .unwrap();
        let err = repo
            .create_user(dto("Ada 2", "ada@example.com", UserRole::Participant))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn list_searches_filters_and_paginates() {
        let repo = UserRepository::new(memory_db().await);
        for n in 0..5 {
            repo.create_user(dto(
                &format!("Participant {n}"),
                &format!("p{n}@example.com"),
                UserRole::Participant,
            ))
            .await
            .unwrap();
        }
        repo.create_user(dto("Root", "root@example.com", UserRole::Admin))
            .await
            .unwrap();

        let admins = repo
            .list_users(GetUserDto {
                role: Some(UserRole::Admin),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(admins.total, 1);
        assert_eq!(admins.items[0].full_name, "Root");

        let page = repo
            .list_users(GetUserDto {
                search: Some("participant".into()),
                page: Some(2),
                page_size: Some(2),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.total_pages, 3);
        assert_eq!(repo.count_users().await.unwrap(), 6);
    }

    #[tokio::test]
    async fn update_changes_only_given_fields() {
        let repo = UserRepository::new(memory_db().await);
        let u = repo
            .create_user(dto("Ada", "ada@example.com", UserRole::Participant))
            .await
            .unwrap();

        let updated = repo
            .update_user(
                &u.id,
                UpdateUserDto {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert!(!updated.is_active);
        assert_eq!(updated.email, "ada@example.com");
        assert!(repo
            .update_user("missing", UpdateUserDto::default())
            .await
            .unwrap()
            .is_none());
    }
}
