use super::model::Holding;
use crate::error::CustomError;

pub struct AccountRepository {
    pool: sqlx::AnyPool,
}

impl AccountRepository {
    pub fn new(pool: sqlx::AnyPool) -> Self {
        AccountRepository { pool }
    }

    /// Current balance in cents.
    pub async fn cash(&self, user_id: i64) -> Result<i64, CustomError> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT cash FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|(cash,)| cash).ok_or(CustomError::Unauthorized)
    }

    /// Symbols the user still holds, with their summed share counts.
    pub async fn holdings(&self, user_id: i64) -> Result<Vec<Holding>, CustomError> {
        let rows = sqlx::query_as::<_, Holding>(
            r#"
            SELECT stock, CAST(SUM(shares) AS BIGINT) AS shares
            FROM transactions
            WHERE user_id = $1
            GROUP BY stock
            HAVING SUM(shares) > 0
            ORDER BY stock
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
