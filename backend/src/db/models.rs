use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row of the `users` table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Fields supplied by the caller when inserting a user. Everything else is server-generated.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
}
