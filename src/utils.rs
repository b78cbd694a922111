use std::collections::HashMap;

use bcrypt::{DEFAULT_COST, hash, verify};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::constants::SESSION_COOKIE;
use crate::error::CustomError;

pub fn des_from_str<T: for<'a> Deserialize<'a>>(body: &str) -> Result<T, CustomError> {
    serde_json::from_str(body).map_err(|_| CustomError::InvalidBody)
}

pub fn ser_to_str<T: Serialize>(t: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string(t)
}

pub fn encrypt(value: &str) -> Result<String, CustomError> {
    hash(value, DEFAULT_COST).map_err(CustomError::HashError)
}

pub fn is_password_valid(value: &str, hashed: &str) -> bool {
    verify(value, hashed).unwrap_or(false)
}

/// Session token from the `session` cookie, falling back to a bearer header.
pub fn extract_token(headers: &HashMap<String, String>) -> Option<String> {
    let from_cookie = headers.get("cookie").and_then(|cookies| {
        cookies.split(';').find_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            (name == SESSION_COOKIE && !value.is_empty()).then(|| value.to_string())
        })
    });
    from_cookie.or_else(|| {
        headers
            .get("authorization")
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(|token| token.trim().to_string())
    })
}

pub fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

pub fn to_dollars(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

/// Rounds a price to whole cents, half away from zero.
pub fn to_cents(amount: Decimal) -> Option<i64> {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    (rounded * Decimal::ONE_HUNDRED).to_i64()
}

pub fn parse_dollars(value: &str) -> Option<i64> {
    value.trim().parse::<Decimal>().ok().and_then(to_cents)
}

pub fn usd(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let dollars = to_dollars(cents.abs()).to_string();
    let (whole, fraction) = dollars.split_once('.').unwrap_or((dollars.as_str(), "00"));
    let mut grouped = String::new();
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{}${}.{}", sign, grouped, fraction)
}
