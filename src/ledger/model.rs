use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::utils::to_dollars;

/// One ledger row. Positive `shares` is a buy, negative a sell.
#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct Transaction {
    pub id: i64,
    pub user_id: i64,
    pub stock: String,
    pub shares: i64,
    /// Execution price in cents.
    pub price: i64,
    pub transacted_at: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TransactionView {
    pub symbol: String,
    pub shares: i64,
    pub price: Decimal,
    pub transacted_at: String,
}

impl From<Transaction> for TransactionView {
    fn from(row: Transaction) -> Self {
        TransactionView {
            symbol: row.stock,
            shares: row.shares,
            price: to_dollars(row.price),
            transacted_at: row.transacted_at,
        }
    }
}

/// Outcome of a committed trade.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Execution {
    pub transaction_id: i64,
    /// Cash left after the trade, in cents.
    pub cash: i64,
}
