use crate::error::CustomError;

use super::model::User;

pub struct AuthRepository {
    pool: sqlx::AnyPool,
}

impl AuthRepository {
    pub async fn new(pool: sqlx::AnyPool) -> Result<Self, CustomError> {
        // Fail early when the pool cannot hand out a connection.
        sqlx::query("SELECT 1").execute(&pool).await?;
        Ok(AuthRepository { pool })
    }

    pub fn print_pool_stats(&self) {
        tracing::debug!(
            total = self.pool.size(),
            idle = self.pool.num_idle(),
            "db pool stats"
        );
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Vec<User>, CustomError> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, hash, cash
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    pub async fn username_exists(&self, username: &str) -> Result<bool, CustomError> {
        Ok(!self.find_by_username(username).await?.is_empty())
    }

    pub async fn insert_user(
        &self,
        username: &str,
        hash: &str,
        cash: i64,
    ) -> Result<i64, CustomError> {
        let row: (i64,) = sqlx::query_as(
            r#"
            INSERT INTO users (username, hash, cash)
            VALUES ($1, $2, $3)
            RETURNING id"#,
        )
        .bind(username)
        .bind(hash)
        .bind(cash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(err) if err.is_unique_violation() => CustomError::UsernameExists,
            e => CustomError::DBError(e),
        })?;

        Ok(row.0)
    }
}
