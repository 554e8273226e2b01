use super::UserRole;

/// Partial user update; `password_hash` is already hashed.
#[derive(Debug, Clone, Default)]
pub struct UpdateUserDto {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub role: Option<UserRole>,
    pub is_active: Option<bool>,
}
