use chrono::Utc;
use sqlx::{Any, Transaction as DbTransaction};

use super::model::{Execution, Transaction};
use crate::error::CustomError;

const HOLDING_SQL: &str = r#"
    SELECT CAST(COALESCE(SUM(shares), 0) AS BIGINT)
    FROM transactions
    WHERE user_id = $1 AND stock = $2
"#;

pub struct LedgerRepository {
    pool: sqlx::AnyPool,
}

impl LedgerRepository {
    pub fn new(pool: sqlx::AnyPool) -> Self {
        LedgerRepository { pool }
    }

    /// Signed sum of the user's shares in `symbol`.
    pub async fn holding(&self, user_id: i64, symbol: &str) -> Result<i64, CustomError> {
        let row: (i64,) = sqlx::query_as(HOLDING_SQL)
            .bind(user_id)
            .bind(symbol)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0)
    }

    pub async fn transactions(&self, user_id: i64) -> Result<Vec<Transaction>, CustomError> {
        let rows = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT id, user_id, stock, shares, price, transacted_at
            FROM transactions
            WHERE user_id = $1
            ORDER BY id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Debits `price * shares` and appends a positive ledger row in one
    /// database transaction. Fails without mutation when cash is short.
    pub async fn record_buy(
        &self,
        user_id: i64,
        symbol: &str,
        shares: i64,
        price: i64,
    ) -> Result<Execution, CustomError> {
        let cost = price
            .checked_mul(shares)
            .ok_or(CustomError::InsufficientFunds)?;
        let mut tx = self.pool.begin().await?;

        // First write of the transaction: takes the user's row lock.
        let debited = sqlx::query("UPDATE users SET cash = cash - $1 WHERE id = $2 AND cash >= $1")
            .bind(cost)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        if debited.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(CustomError::InsufficientFunds);
        }

        let transaction_id = insert_row(&mut tx, user_id, symbol, shares, price).await?;
        let cash = cash_of(&mut tx, user_id).await?;
        tx.commit().await?;

        Ok(Execution {
            transaction_id,
            cash,
        })
    }

    /// Credits `price * shares` and appends a negative ledger row in one
    /// database transaction. The holding is re-read under the user's row lock.
    pub async fn record_sell(
        &self,
        user_id: i64,
        symbol: &str,
        shares: i64,
        price: i64,
    ) -> Result<Execution, CustomError> {
        let proceeds = price
            .checked_mul(shares)
            .ok_or(CustomError::InvalidShares)?;
        let mut tx = self.pool.begin().await?;

        let locked = sqlx::query("UPDATE users SET cash = cash WHERE id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        if locked.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(CustomError::Unauthorized);
        }

        let (held,): (i64,) = sqlx::query_as(HOLDING_SQL)
            .bind(user_id)
            .bind(symbol)
            .fetch_one(&mut *tx)
            .await?;
        if let Err(e) = check_holding(held, shares) {
            tx.rollback().await?;
            return Err(e);
        }

        let transaction_id = insert_row(&mut tx, user_id, symbol, -shares, price).await?;
        sqlx::query("UPDATE users SET cash = cash + $1 WHERE id = $2")
            .bind(proceeds)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        let cash = cash_of(&mut tx, user_id).await?;
        tx.commit().await?;

        Ok(Execution {
            transaction_id,
            cash,
        })
    }
}

/// Ownership rule shared by the pre-check and the in-transaction re-check.
pub fn check_holding(held: i64, shares: i64) -> Result<(), CustomError> {
    if held <= 0 {
        Err(CustomError::NoSharesOwned)
    } else if held < shares {
        Err(CustomError::InsufficientShares)
    } else {
        Ok(())
    }
}

async fn insert_row(
    tx: &mut DbTransaction<'_, Any>,
    user_id: i64,
    symbol: &str,
    shares: i64,
    price: i64,
) -> Result<i64, CustomError> {
    let row: (i64,) = sqlx::query_as(
        r#"
        INSERT INTO transactions (user_id, stock, shares, price, transacted_at)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id"#,
    )
    .bind(user_id)
    .bind(symbol)
    .bind(shares)
    .bind(price)
    .bind(Utc::now().to_rfc3339())
    .fetch_one(&mut **tx)
    .await?;
    Ok(row.0)
}

async fn cash_of(tx: &mut DbTransaction<'_, Any>, user_id: i64) -> Result<i64, CustomError> {
    let row: (i64,) = sqlx::query_as("SELECT cash FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_one(&mut **tx)
        .await?;
    Ok(row.0)
}
