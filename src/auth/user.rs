use serde::Serialize;

#[derive(Debug, Serialize, Clone)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub is_admin: bool,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbUser {
    pub id: Option<i64>,
    pub username: Option<String>,
    pub is_admin: Option<bool>,
}

impl From<DbUser> for User {
    fn from(user: DbUser) -> Self {
        Self {
            id: user.id.unwrap_or_default(),
            username: user.username.unwrap_or_default(),
            is_admin: user.is_admin.unwrap_or_default(),
        }
    }
}

/// Request guard wrapper proving the session user holds the admin flag.
/// Constructed only by the `FromRequest` impl in `authentication.rs`.
#[derive(Debug, Serialize, Clone)]
pub struct AdminUser(pub User);
