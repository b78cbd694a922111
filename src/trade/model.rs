use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::utils::to_dollars;

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct TradeRequest {
    #[serde(default)]
    pub symbol: String,
    pub shares: Option<i64>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TradeReceipt {
    pub symbol: String,
    pub name: String,
    pub shares: i64,
    pub price: Decimal,
    pub total: Decimal,
    /// Cash left after the trade.
    pub cash: Decimal,
}

impl TradeReceipt {
    /// Amounts are in cents.
    pub fn new(symbol: String, name: String, shares: i64, price: i64, cash: i64) -> Self {
        Self {
            symbol,
            name,
            shares,
            price: to_dollars(price),
            total: to_dollars(price) * Decimal::from(shares),
            cash: to_dollars(cash),
        }
    }
}
