use std::{error::Error, fmt::Debug};

use crate::constants::{
    BAD_REQUEST, FORBIDDEN, INTERNAL_ERROR, METHOD_NOT_ALLOWED, NOT_FOUND, UNAUTHORIZED,
};

#[derive(thiserror::Error)]
pub enum CustomError {
    #[error("must provide {0}")]
    MissingField(&'static str),

    #[error("must provide {0}")]
    MissingCredential(&'static str),

    #[error("invalid body")]
    InvalidBody,

    #[error("invalid number of shares")]
    InvalidShares,

    #[error("passwords do not match")]
    PasswordMismatch,

    #[error("username taken")]
    UsernameExists,

    #[error("invalid symbol")]
    InvalidSymbol,

    #[error("quote unavailable for {0}")]
    QuoteUnavailable(String),

    #[error("insufficient funds")]
    InsufficientFunds,

    #[error("no shares owned")]
    NoSharesOwned,

    #[error("insufficient shares")]
    InsufficientShares,

    #[error("login required")]
    Unauthorized,

    #[error("invalid username and/or password")]
    InvalidCredentials,

    #[error("not found")]
    NotFound,

    #[error("method not allowed")]
    MethodNotAllowed,

    #[error("ENV '{0}' Not Found")]
    EnvError(String, #[source] std::env::VarError),

    #[error("ENV '{0}' is not valid")]
    InvalidEnv(String),

    #[error("Database query")]
    DBError(#[source] sqlx::Error),

    #[error("Password hashing")]
    HashError(#[source] bcrypt::BcryptError),

    #[error("Session token")]
    TokenError(#[source] jsonwebtoken::errors::Error),

    #[error("{0}")]
    Internal(String),
}

impl CustomError {
    /// Internal failures are logged and replaced by a generic message.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            CustomError::EnvError(..)
                | CustomError::InvalidEnv(_)
                | CustomError::DBError(_)
                | CustomError::HashError(_)
                | CustomError::TokenError(_)
                | CustomError::Internal(_)
        )
    }

    pub fn status_line(&self) -> &'static str {
        match self {
            CustomError::Unauthorized => UNAUTHORIZED,
            CustomError::InvalidCredentials | CustomError::MissingCredential(_) => {
                FORBIDDEN
            }
            CustomError::NotFound => NOT_FOUND,
            CustomError::MethodNotAllowed => METHOD_NOT_ALLOWED,
            e if e.is_internal() => INTERNAL_ERROR,
            _ => BAD_REQUEST,
        }
    }

    pub fn into_response(self) -> (String, String) {
        if self.is_internal() {
            tracing::error!(error = ?self, "request failed");
            return (INTERNAL_ERROR.to_string(), "internal server error".to_string());
        }
        (self.status_line().to_string(), self.to_string())
    }
}

impl From<sqlx::Error> for CustomError {
    fn from(e: sqlx::Error) -> Self {
        CustomError::DBError(e)
    }
}

impl Debug for CustomError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)?;
        if let Some(source) = self.source() {
            write!(f, " (Caused by: {})", source)?;
        }
        Ok(())
    }
}
