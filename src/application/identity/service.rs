//! User management service
//!
//! Registration, login and administrator-side user management. HTTP handlers
//! are thin wrappers that delegate here.

use std::sync::Arc;

use tracing::info;

use crate::domain::{
    CreateUserDto, DomainError, DomainResult, GetUserDto, RepositoryProvider, UpdateUserDto, User,
    UserRole,
};
use crate::infrastructure::crypto::jwt::{create_token, JwtConfig};
use crate::infrastructure::crypto::password::{hash_password, verify_password};
use crate::shared::PaginatedResult;

const MIN_PASSWORD_LEN: usize = 6;
const MIN_NAME_LEN: usize = 2;

/// Result of a successful login
#[derive(Debug, Clone)]
pub struct AuthResult {
    pub token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: User,
}

/// Fields an administrator may change on a user; the password is plain text.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<UserRole>,
    pub is_active: Option<bool>,
}

pub struct UserService {
    repos: Arc<dyn RepositoryProvider>,
    jwt_config: JwtConfig,
}

impl UserService {
    pub fn new(repos: Arc<dyn RepositoryProvider>, jwt_config: JwtConfig) -> Self {
        Self { repos, jwt_config }
    }

    // ── Authentication ──────────────────────────────────────────

    /// Authenticate by email and password and issue a JWT.
    pub async fn login(&self, email: &str, password: &str) -> DomainResult<AuthResult> {
        let Some(user) = self.repos.users().get_user_by_email(email.trim()).await? else {
            return Err(DomainError::Unauthorized("Invalid credentials".into()));
        };

        if !verify_password(password, &user.password_hash) {
            return Err(DomainError::Unauthorized("Invalid credentials".into()));
        }

        if !user.is_active {
            return Err(DomainError::Unauthorized("Account is disabled".into()));
        }

        let token = create_token(&user.id, &user.email, user.role.as_str(), &self.jwt_config)
            .map_err(|e| DomainError::Storage(format!("Failed to create token: {}", e)))?;

        info!(user_id = %user.id, "User logged in");
        Ok(AuthResult {
            token,
            token_type: "Bearer".into(),
            expires_in: self.jwt_config.expiration_hours * 3600,
            user,
        })
    }

    /// Self-service registration; always creates a participant.
    pub async fn register(&self, full_name: &str, email: &str, password: &str) -> DomainResult<User> {
        let user = self
            .create_user(full_name, email, password, UserRole::Participant)
            .await?;
        info!(user_id = %user.id, "New participant registered");
        Ok(user)
    }

    /// The authenticated user's own record.
    pub async fn me(&self, user_id: &str) -> DomainResult<User> {
        self.get_user(user_id).await
    }

    // ── Administration ──────────────────────────────────────────

    pub async fn list_users(&self, dto: GetUserDto) -> DomainResult<PaginatedResult<User>> {
        self.repos.users().list_users(dto).await
    }

    pub async fn get_user(&self, id: &str) -> DomainResult<User> {
        self.repos
            .users()
            .get_user_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("User", id))
    }

    pub async fn create_user(
        &self,
        full_name: &str,
        email: &str,
        password: &str,
        role: UserRole,
    ) -> DomainResult<User> {
        let full_name = validate_name(full_name)?;
        let email = normalize_email(email)?;
        validate_password(password)?;

        if self.repos.users().get_user_by_email(&email).await?.is_some() {
            return Err(DomainError::Conflict("Email already exists".into()));
        }

        let user = self
            .repos
            .users()
            .create_user(CreateUserDto {
                full_name,
                email,
                password_hash: hash(password)?,
                role,
            })
            .await?;
        info!(user_id = %user.id, role = %user.role, "User created");
        Ok(user)
    }

    pub async fn update_user(&self, id: &str, changes: UserChanges) -> DomainResult<User> {
        let mut dto = UpdateUserDto {
            role: changes.role,
            is_active: changes.is_active,
            ..Default::default()
        };
        if let Some(name) = changes.full_name.as_deref() {
            dto.full_name = Some(validate_name(name)?);
        }
        if let Some(email) = changes.email.as_deref() {
            let email = normalize_email(email)?;
            if let Some(other) = self.repos.users().get_user_by_email(&email).await? {
                if other.id != id {
                    return Err(DomainError::Conflict("Email already exists".into()));
                }
            }
            dto.email = Some(email);
        }
        if let Some(password) = changes.password.as_deref() {
            validate_password(password)?;
            dto.password_hash = Some(hash(password)?);
        }

        let user = self
            .repos
            .users()
            .update_user(id, dto)
            .await?
            .ok_or_else(|| DomainError::not_found("User", id))?;
        info!(user_id = %user.id, "User updated");
        Ok(user)
    }

    /// Create the initial administrator when no user exists yet.
    /// Returns `true` when an account was created.
    pub async fn ensure_admin(
        &self,
        full_name: &str,
        email: &str,
        password: &str,
    ) -> DomainResult<bool> {
        if self.repos.users().count_users().await? > 0 {
            return Ok(false);
        }
        self.create_user(full_name, email, password, UserRole::Admin)
            .await?;
        info!(email, "Seeded default administrator");
        Ok(true)
    }
}

// ── Helpers ─────────────────────────────────────────────────────

fn hash(password: &str) -> DomainResult<String> {
    hash_password(password)
        .map_err(|e| DomainError::Storage(format!("Failed to hash password: {}", e)))
}

fn validate_name(name: &str) -> DomainResult<String> {
    let name = name.trim();
    if name.chars().count() < MIN_NAME_LEN {
        return Err(DomainError::Validation(format!(
            "Full name must be at least {} characters",
            MIN_NAME_LEN
        )));
    }
    Ok(name.to_string())
}

fn normalize_email(email: &str) -> DomainResult<String> {
    let email = email.trim().to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.'),
        None => false,
    };
    if !valid {
        return Err(DomainError::Validation("Invalid email address".into()));
    }
    Ok(email)
}

fn validate_password(password: &str) -> DomainResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(DomainError::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}
