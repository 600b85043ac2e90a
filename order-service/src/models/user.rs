use serde::Serialize;
use sqlx::FromRow;

/// Back-office account allowed to use the admin routes.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub name: Option<String>,
}
