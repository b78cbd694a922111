use serde::Serialize;

use super::model::TradeRequest;
use super::service::TradeService;
use crate::{
    auth::model::CurrentUser,
    constants::OK_RESPONSE,
    error::CustomError,
    quote::model::QuoteRequest,
    req::{
        Method::{self, GET, POST},
        Request,
    },
    utils::{des_from_str, ser_to_str},
};

/// Paths served by this controller; all of them require a session.
pub const ROUTES: &[&str] = &["/", "/buy", "/sell", "/quote", "/history"];

pub struct TradeController {
    service: TradeService,
}

impl TradeController {
    pub fn new(service: TradeService) -> Self {
        TradeController { service }
    }

    pub fn serves(path: &str) -> bool {
        ROUTES.contains(&path)
    }

    pub async fn handle(&self, request: &Request, user: &CurrentUser) -> (String, String) {
        self.route(&request.method, &request.path, &request.body, user)
            .await
            .unwrap_or_else(CustomError::into_response)
    }

    async fn route(
        &self,
        method: &Method,
        path: &str,
        body: &str,
        user: &CurrentUser,
    ) -> Result<(String, String), CustomError> {
        match (method, path) {
            (GET, "/") => ok_json(&self.service.portfolio(user).await?),
            (GET, "/history") => ok_json(&self.service.history(user).await?),
            (POST, "/buy") => {
                let request: TradeRequest = des_from_str(body)?;
                ok_json(&self.service.buy(user, &request).await?)
            }
            (POST, "/sell") => {
                let request: TradeRequest = des_from_str(body)?;
                ok_json(&self.service.sell(user, &request).await?)
            }
            (POST, "/quote") => {
                let request: QuoteRequest = des_from_str(body)?;
                ok_json(&self.service.quote(&request.symbol).await?)
            }
            (_, path) if Self::serves(path) => Err(CustomError::MethodNotAllowed),
            _ => Err(CustomError::NotFound),
        }
    }
}

fn ok_json<T: Serialize>(value: &T) -> Result<(String, String), CustomError> {
    let body = ser_to_str(value).map_err(|e| CustomError::Internal(e.to_string()))?;
    Ok((OK_RESPONSE.to_string(), body))
}
