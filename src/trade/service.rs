use std::sync::Arc;

use super::model::{TradeReceipt, TradeRequest};
use crate::account::model::{Portfolio, Position};
use crate::account::repository::AccountRepository;
use crate::auth::model::CurrentUser;
use crate::error::CustomError;
use crate::ledger::model::TransactionView;
use crate::ledger::repository::{LedgerRepository, check_holding};
use crate::quote::QuoteProvider;
use crate::quote::model::Quote;
use crate::utils::{normalize_symbol, to_cents, to_dollars, usd};
use rust_decimal::Decimal;

pub struct TradeService {
    accounts: AccountRepository,
    ledger: LedgerRepository,
    quotes: Arc<dyn QuoteProvider>,
}

/// Validated trade input.
struct Order {
    symbol: String,
    shares: i64,
}

impl TryFrom<&TradeRequest> for Order {
    type Error = CustomError;

    fn try_from(request: &TradeRequest) -> Result<Self, CustomError> {
        let symbol = normalize_symbol(&request.symbol);
        if symbol.is_empty() {
            return Err(CustomError::MissingField("symbol"));
        }
        let shares = request.shares.ok_or(CustomError::MissingField("shares"))?;
        if shares < 1 {
            return Err(CustomError::InvalidShares);
        }
        Ok(Order { symbol, shares })
    }
}

impl TradeService {
    pub fn new(
        accounts: AccountRepository,
        ledger: LedgerRepository,
        quotes: Arc<dyn QuoteProvider>,
    ) -> Self {
        TradeService {
            accounts,
            ledger,
            quotes,
        }
    }

    pub async fn quote(&self, symbol: &str) -> Result<Quote, CustomError> {
        let symbol = normalize_symbol(symbol);
        if symbol.is_empty() {
            return Err(CustomError::MissingField("symbol"));
        }
        self.quotes.lookup(&symbol).await
    }

    pub async fn buy(
        &self,
        user: &CurrentUser,
        request: &TradeRequest,
    ) -> Result<TradeReceipt, CustomError> {
        let order = Order::try_from(request)?;
        let (quote, price) = self.price(&order.symbol).await?;

        let execution = self
            .ledger
            .record_buy(user.user_id, &order.symbol, order.shares, price)
            .await
            .inspect_err(|e| {
                tracing::info!(
                    user_id = user.user_id,
                    symbol = %order.symbol,
                    shares = order.shares,
                    "buy rejected: {}",
                    e
                )
            })?;

        tracing::info!(
            user_id = user.user_id,
            symbol = %order.symbol,
            shares = order.shares,
            price = %usd(price),
            cash = %usd(execution.cash),
            "bought shares"
        );
        Ok(TradeReceipt::new(
            order.symbol,
            quote.name,
            order.shares,
            price,
            execution.cash,
        ))
    }

    pub async fn sell(
        &self,
        user: &CurrentUser,
        request: &TradeRequest,
    ) -> Result<TradeReceipt, CustomError> {
        let order = Order::try_from(request)?;

        let held = self.ledger.holding(user.user_id, &order.symbol).await?;
        check_holding(held, order.shares)?;

        let (quote, price) = self.price(&order.symbol).await?;
        let execution = self
            .ledger
            .record_sell(user.user_id, &order.symbol, order.shares, price)
            .await
            .inspect_err(|e| {
                tracing::info!(
                    user_id = user.user_id,
                    symbol = %order.symbol,
                    shares = order.shares,
                    "sell rejected: {}",
                    e
                )
            })?;

        tracing::info!(
            user_id = user.user_id,
            symbol = %order.symbol,
            shares = order.shares,
            price = %usd(price),
            cash = %usd(execution.cash),
            "sold shares"
        );
        Ok(TradeReceipt::new(
            order.symbol,
            quote.name,
            order.shares,
            price,
            execution.cash,
        ))
    }

    pub async fn portfolio(&self, user: &CurrentUser) -> Result<Portfolio, CustomError> {
        let cash = self.accounts.cash(user.user_id).await?;
        let holdings = self.accounts.holdings(user.user_id).await?;

        let mut total = cash;
        let mut positions = Vec::with_capacity(holdings.len());
        for holding in holdings {
            let quote = self.quotes.lookup(&holding.stock).await?;
            let unavailable = || CustomError::QuoteUnavailable(holding.stock.clone());
            let price = quoted_cents(quote.price).ok_or_else(unavailable)?;
            let value = price.checked_mul(holding.shares).ok_or_else(unavailable)?;
            total = total.checked_add(value).ok_or_else(unavailable)?;
            positions.push(Position {
                name: quote.name,
                shares: holding.shares,
                price: to_dollars(price),
                value: to_dollars(value),
                symbol: holding.stock,
            });
        }

        Ok(Portfolio {
            cash: to_dollars(cash),
            positions,
            total: to_dollars(total),
        })
    }

    pub async fn history(&self, user: &CurrentUser) -> Result<Vec<TransactionView>, CustomError> {
        let rows = self.ledger.transactions(user.user_id).await?;
        Ok(rows.into_iter().map(TransactionView::from).collect())
    }

    /// Looks up `symbol` and returns the quote with its price in cents.
    async fn price(&self, symbol: &str) -> Result<(Quote, i64), CustomError> {
        let quote = self.quotes.lookup(symbol).await.map_err(|e| match e {
            CustomError::QuoteUnavailable(_) => CustomError::InvalidSymbol,
            e => e,
        })?;
        let price = quoted_cents(quote.price).ok_or(CustomError::InvalidSymbol)?;
        Ok((quote, price))
    }
}

/// A quoted price in cents, if it is at least one cent.
fn quoted_cents(price: Decimal) -> Option<i64> {
    to_cents(price).filter(|cents| *cents > 0)
}
