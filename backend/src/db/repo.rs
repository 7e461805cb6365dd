use std::str::FromStr;
use std::time::Duration;

use chrono::Utc;
use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions},
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    PgPool, SqlitePool,
};

use crate::config::DatabaseConfig;
use crate::db::models::{NewUser, User};

const MAX_CONNECTIONS: u32 = 5;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Handle to the users store. Cloning is cheap, every clone shares the same pool.
#[derive(Debug, Clone)]
pub enum Database {
    Postgres(PgPool),
    Sqlite(SqlitePool),
}

impl Database {
    /// Builds the pool without opening a connection, so the server can start
    /// while the database is still unreachable.
    pub fn connect_lazy(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        match config {
            DatabaseConfig::Postgres {
                user,
                host,
                name,
                password,
                port,
            } => {
                let options = PgConnectOptions::new()
                    .host(host)
                    .port(*port)
                    .username(user)
                    .password(password)
                    .database(name);
                Ok(Self::postgres_lazy(options))
            }
            DatabaseConfig::Url(url) if url.starts_with("sqlite:") => {
                let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
                Ok(Self::sqlite_lazy(options))
            }
            DatabaseConfig::Url(url) => Ok(Self::postgres_lazy(PgConnectOptions::from_str(url)?)),
        }
    }

    /// Connects to a SQLite database and makes sure the users table exists.
    pub async fn connect_sqlite(url: &str) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let db = Self::sqlite_lazy(options);
        create_user_table(&db).await?;
        Ok(db)
    }

    fn postgres_lazy(options: PgConnectOptions) -> Self {
        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect_lazy_with(options);
        Database::Postgres(pool)
    }

    fn sqlite_lazy(options: SqliteConnectOptions) -> Self {
        // An in-memory database only lives as long as its connection, so keep exactly one forever.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect_lazy_with(options);
        Database::Sqlite(pool)
    }

    /// Checks out one connection and hands it straight back.
    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        match self {
            Database::Postgres(pool) => pool.acquire().await.map(|_| ()),
            Database::Sqlite(pool) => pool.acquire().await.map(|_| ()),
        }
    }

    pub async fn close(&self) {
        match self {
            Database::Postgres(pool) => pool.close().await,
            Database::Sqlite(pool) => pool.close().await,
        }
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            Database::Postgres(_) => "postgres",
            Database::Sqlite(_) => "sqlite",
        }
    }
}

pub async fn create_user_table(db: &Database) -> Result<(), sqlx::Error> {
    match db {
        Database::Postgres(pool) => {
            sqlx::query(
                r#"
                CREATE TABLE IF NOT EXISTS users (
                    id BIGSERIAL PRIMARY KEY,
                    username TEXT NOT NULL,
                    email TEXT UNIQUE NOT NULL,
                    is_active BOOLEAN NOT NULL DEFAULT TRUE,
                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                )
                "#,
            )
            .execute(pool)
            .await?;
        }
        Database::Sqlite(pool) => {
            sqlx::query(
                r#"
                CREATE TABLE IF NOT EXISTS users (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    username TEXT NOT NULL,
                    email TEXT UNIQUE NOT NULL,
                    is_active BOOLEAN NOT NULL DEFAULT 1,
                    created_at TEXT NOT NULL
                )
                "#,
            )
            .execute(pool)
            .await?;
        }
    }

    Ok(())
}

/// Inserts an active user stamped with the current time and returns the stored row.
/// The insert is only committed once the returned row has decoded.
pub async fn insert_user(db: &Database, user: &NewUser) -> Result<User, sqlx::Error> {
    match db {
        Database::Postgres(pool) => {
            let mut tx = pool.begin().await?;
            // Casts keep older tables (SERIAL ids, TIMESTAMP columns) decodable.
            let row = sqlx::query_as::<_, User>(
                r#"
                INSERT INTO users (username, email, is_active, created_at)
                VALUES ($1, $2, $3, NOW())
                RETURNING id::BIGINT AS id, username, email, is_active,
                          created_at::TIMESTAMPTZ AS created_at
                "#,
            )
            .bind(&user.username)
            .bind(&user.email)
            .bind(true)
            .fetch_one(&mut *tx)
            .await?;
            tx.commit().await?;
            Ok(row)
        }
        Database::Sqlite(pool) => {
            let mut tx = pool.begin().await?;
            let row = sqlx::query_as::<_, User>(
                r#"
                INSERT INTO users (username, email, is_active, created_at)
                VALUES (?, ?, ?, ?)
                RETURNING id, username, email, is_active, created_at
                "#,
            )
            .bind(&user.username)
            .bind(&user.email)
            .bind(true)
            .bind(Utc::now())
            .fetch_one(&mut *tx)
            .await?;
            tx.commit().await?;
            Ok(row)
        }
    }
}

/// All users, newest first. Rows sharing a timestamp fall back to insertion order.
pub async fn list_users(db: &Database) -> Result<Vec<User>, sqlx::Error> {
    match db {
        Database::Postgres(pool) => {
            sqlx::query_as::<_, User>(
                r#"
                SELECT id::BIGINT AS id, username, email, is_active,
                       created_at::TIMESTAMPTZ AS created_at
                FROM users
                ORDER BY created_at DESC, id DESC
                "#,
            )
            .fetch_all(pool)
            .await
        }
        Database::Sqlite(pool) => {
            sqlx::query_as::<_, User>(
                r#"
                SELECT id, username, email, is_active, created_at
                FROM users
                ORDER BY created_at DESC, id DESC
                "#,
            )
            .fetch_all(pool)
            .await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_db() -> Database {
        Database::connect_sqlite("sqlite::memory:").await.unwrap()
    }

    fn new_user(name: &str, email: &str) -> NewUser {
        NewUser {
            username: name.to_string(),
            email: email.to_string(),
        }
    }

    #[tokio::test]
    async fn test_insert_returns_stored_row() {
        let db = memory_db().await;

        let user = insert_user(&db, &new_user("Asha", "asha@example.com")).await.unwrap();
        assert_eq!(user.username, "Asha");
        assert_eq!(user.email, "asha@example.com");
        assert!(user.is_active);
        assert!(user.id > 0);
    }

    #[tokio::test]
    async fn test_list_is_newest_first() {
        let db = memory_db().await;

        let first = insert_user(&db, &new_user("A", "a@example.com")).await.unwrap();
        let second = insert_user(&db, &new_user("B", "b@example.com")).await.unwrap();

        let users = list_users(&db).await.unwrap();
        let ids: Vec<i64> = users.iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[tokio::test]
    async fn test_duplicate_email_is_rejected() {
        let db = memory_db().await;

        insert_user(&db, &new_user("A", "same@example.com")).await.unwrap();
        let result = insert_user(&db, &new_user("B", "same@example.com")).await;
        assert!(result.is_err());
        assert_eq!(list_users(&db).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_undecodable_row_is_not_committed() {
        let db = Database::connect_lazy(&DatabaseConfig::Url("sqlite::memory:".to_string())).unwrap();
        let Database::Sqlite(pool) = &db else {
            panic!("expected sqlite backend");
        };
        // A legacy table whose is_active column comes back as text.
        sqlx::query(
            "CREATE TABLE users (id INTEGER PRIMARY KEY, username TEXT, email TEXT, is_active TEXT, created_at TEXT)",
        )
        .execute(pool)
        .await
        .unwrap();

        let result = insert_user(&db, &new_user("A", "a@example.com")).await;
        assert!(matches!(result, Err(sqlx::Error::ColumnDecode { .. })));

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_closed_pool_fails() {
        let db = memory_db().await;
        db.close().await;

        assert!(db.ping().await.is_err());
        assert!(list_users(&db).await.is_err());
    }

    #[tokio::test]
    async fn test_lazy_postgres_does_not_connect() {
        let config = DatabaseConfig::Postgres {
            user: "postgres".to_string(),
            host: "localhost".to_string(),
            name: "thegaadi".to_string(),
            password: "12345678".to_string(),
            port: 5432,
        };
        let db = Database::connect_lazy(&config).unwrap();
        assert_eq!(db.backend_name(), "postgres");
    }
}
