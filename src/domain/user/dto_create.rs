use super::UserRole;

/// New user record; the password is already hashed.
#[derive(Debug, Clone)]
pub struct CreateUserDto {
    pub full_name: String,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
}
