use super::UserRole;

#[derive(Debug, Clone, Default)]
pub struct GetUserDto {
    /// Case-insensitive match on full name or email
    pub search: Option<String>,
    pub role: Option<UserRole>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}
