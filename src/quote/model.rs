use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Quote {
    pub symbol: String,
    pub name: String,
    pub price: Decimal,
}

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct QuoteRequest {
    #[serde(default)]
    pub symbol: String,
}
