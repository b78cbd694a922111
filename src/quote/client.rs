use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use rust_decimal::Decimal;
use serde::Deserialize;

use super::QuoteProvider;
use super::model::Quote;
use crate::error::CustomError;

#[derive(Debug, Deserialize)]
struct IexQuote {
    symbol: String,
    #[serde(rename = "companyName")]
    company_name: String,
    #[serde(rename = "latestPrice", with = "rust_decimal::serde::float")]
    latest_price: Decimal,
}

/// Quote lookups against an IEX Cloud compatible `/stock/{symbol}/quote` API.
#[derive(Clone)]
pub struct IexClient {
    base_url: String,
    api_key: String,
    client: Client,
}

impl IexClient {
    pub fn new(base_url: String, api_key: String, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            base_url,
            api_key,
            client,
        }
    }

    fn quote_url(&self, symbol: &str) -> Option<Url> {
        let mut url = Url::parse(&self.base_url).ok()?;
        url.path_segments_mut()
            .ok()?
            .pop_if_empty()
            .extend(["stock", symbol, "quote"]);
        url.query_pairs_mut().append_pair("token", &self.api_key);
        Some(url)
    }

    async fn fetch(&self, symbol: &str) -> Result<IexQuote, String> {
        let url = self
            .quote_url(symbol)
            .ok_or_else(|| format!("invalid quote url {}", self.base_url))?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        if !response.status().is_success() {
            return Err(format!("Quote HTTP {}", response.status()));
        }

        response.json::<IexQuote>().await.map_err(|e| e.to_string())
    }
}

#[async_trait]
impl QuoteProvider for IexClient {
    async fn lookup(&self, symbol: &str) -> Result<Quote, CustomError> {
        match self.fetch(symbol).await {
            Ok(quote) if quote.latest_price > Decimal::ZERO => Ok(Quote {
                symbol: quote.symbol,
                name: quote.company_name,
                price: quote.latest_price,
            }),
            Ok(quote) => {
                tracing::warn!(symbol, price = %quote.latest_price, "quote has no usable price");
                Err(CustomError::QuoteUnavailable(symbol.to_string()))
            }
            Err(e) => {
                tracing::warn!(symbol, error = %e, "quote lookup failed");
                Err(CustomError::QuoteUnavailable(symbol.to_string()))
            }
        }
    }
}
