use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Summed position in one symbol.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Holding {
    pub stock: String,
    pub shares: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Position {
    pub symbol: String,
    pub name: String,
    pub shares: i64,
    pub price: Decimal,
    pub value: Decimal,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Portfolio {
    pub cash: Decimal,
    pub positions: Vec<Position>,
    pub total: Decimal,
}
