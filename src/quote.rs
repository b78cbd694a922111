pub mod client;
pub mod model;

use async_trait::async_trait;

use crate::error::CustomError;
use model::Quote;

/// Source of current stock prices. Every call is a fresh lookup.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Fails with `CustomError::QuoteUnavailable` when the symbol cannot be priced.
    async fn lookup(&self, symbol: &str) -> Result<Quote, CustomError>;
}
