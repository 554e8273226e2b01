//! User DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::application::UserChanges;
use crate::domain::{DomainResult, GetUserDto, User};

/// User API representation
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserDto {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub role: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserDto {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            full_name: u.full_name,
            email: u.email,
            role: u.role.to_string(),
            is_active: u.is_active,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

/// Create user request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUserRequest {
    #[validate(length(min = 2, max = 100, message = "full_name must be 2–100 characters"))]
    pub full_name: String,
    #[validate(email(message = "invalid email format"))]
    pub email: String,
    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    pub password: String,
    /// admin or participant
    #[serde(default = "default_role")]
    pub role: String,
}

fn default_role() -> String {
    "participant".to_string()
}

/// Update user request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateUserRequest {
    #[validate(length(min = 2, max = 100, message = "full_name must be 2–100 characters"))]
    pub full_name: Option<String>,
    #[validate(email(message = "invalid email format"))]
    pub email: Option<String>,
    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    pub password: Option<String>,
    pub role: Option<String>,
    pub is_active: Option<bool>,
}

impl UpdateUserRequest {
    pub fn into_changes(self) -> DomainResult<UserChanges> {
        Ok(UserChanges {
            full_name: self.full_name,
            email: self.email,
            password: self.password,
            role: self.role.as_deref().map(str::parse).transpose()?,
            is_active: self.is_active,
        })
    }
}

/// List users query parameters
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListUsersParams {
    /// Search by name or email
    pub search: Option<String>,
    /// Filter by role (admin, participant)
    pub role: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl ListUsersParams {
    pub fn into_query(self) -> DomainResult<GetUserDto> {
        Ok(GetUserDto {
            search: self.search,
            role: self.role.as_deref().map(str::parse).transpose()?,
            page: self.page,
            page_size: self.page_size,
        })
    }
}
