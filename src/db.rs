use sqlx::{AnyPool, Pool};

use crate::error::CustomError;

const SQLITE_SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT UNIQUE NOT NULL,
        hash TEXT NOT NULL,
        cash BIGINT NOT NULL
    )"#,
    r#"
    CREATE TABLE IF NOT EXISTS transactions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL REFERENCES users (id),
        stock TEXT NOT NULL,
        shares BIGINT NOT NULL,
        price BIGINT NOT NULL,
        transacted_at TEXT NOT NULL
    )"#,
    "CREATE INDEX IF NOT EXISTS transactions_user_stock ON transactions (user_id, stock)",
];

const POSTGRES_SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id BIGSERIAL PRIMARY KEY,
        username TEXT UNIQUE NOT NULL,
        hash TEXT NOT NULL,
        cash BIGINT NOT NULL
    )"#,
    r#"
    CREATE TABLE IF NOT EXISTS transactions (
        id BIGSERIAL PRIMARY KEY,
        user_id BIGINT NOT NULL REFERENCES users (id),
        stock TEXT NOT NULL,
        shares BIGINT NOT NULL,
        price BIGINT NOT NULL,
        transacted_at TEXT NOT NULL
    )"#,
    "CREATE INDEX IF NOT EXISTS transactions_user_stock ON transactions (user_id, stock)",
];

pub struct Database {
    pub pool: Pool<sqlx::Any>,
}

impl Database {
    pub async fn new_pool(url: &str) -> Result<Pool<sqlx::Any>, CustomError> {
        sqlx::any::install_default_drivers();
        sqlx::any::AnyPoolOptions::new()
            .max_connections(10)
            .idle_timeout(std::time::Duration::from_secs(30))
            .connect(url)
            .await
            .map_err(CustomError::DBError)
    }

    pub async fn connect(url: &str) -> Result<Self, CustomError> {
        let pool = Self::new_pool(url).await?;
        Self::migrate(&pool, url).await?;
        Ok(Database { pool })
    }

    /// Creates the tables if missing, picking the dialect from the URL scheme.
    pub async fn migrate(pool: &AnyPool, url: &str) -> Result<(), CustomError> {
        let schema = if url.starts_with("postgres") {
            POSTGRES_SCHEMA
        } else {
            SQLITE_SCHEMA
        };
        for statement in schema {
            sqlx::query(statement).execute(pool).await?;
        }
        tracing::info!(tables = "users, transactions", "database schema ready");
        Ok(())
    }
}
