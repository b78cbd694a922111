use std::collections::HashMap;
use std::sync::Arc;

use super::model::{CurrentUser, LoginRequest, RegisterRequest, User};
use super::repository::AuthRepository;
use super::session::SessionStore;
use crate::{
    error::CustomError,
    utils::{encrypt, extract_token, is_password_valid},
};

/// Well-formed hash at the default cost, verified against when the username
/// is unknown so that both login failures cost one bcrypt verification.
const UNKNOWN_USER_HASH: &str = "$2b$12$FinanceSimUnknownUser.LoginTimingEqualiserDigest0000.";

pub struct AuthService {
    repository: AuthRepository,
    sessions: Arc<SessionStore>,
    starting_cash: i64,
}

impl AuthService {
    pub fn new(
        repository: AuthRepository,
        sessions: Arc<SessionStore>,
        starting_cash: i64,
    ) -> Self {
        AuthService {
            repository,
            sessions,
            starting_cash,
        }
    }

    /// Checks the credentials and opens a session, returning its token.
    /// Any session already presented in `headers` is closed first.
    pub async fn login(
        &self,
        req_user: &LoginRequest,
        headers: &HashMap<String, String>,
    ) -> Result<String, CustomError> {
        self.repository.print_pool_stats();
        if let Some(previous) = extract_token(headers) {
            self.sessions.revoke(&previous).await;
        }

        if req_user.username.is_empty() {
            return Err(CustomError::MissingCredential("username"));
        }
        if req_user.password.is_empty() {
            return Err(CustomError::MissingCredential("password"));
        }

        let rows = self.repository.find_by_username(&req_user.username).await?;
        let user_db: Option<&User> = match rows.as_slice() {
            [user] => Some(user),
            _ => None,
        };
        let hash = user_db.map_or(UNKNOWN_USER_HASH, |user| user.hash.as_str());
        let verified = is_password_valid(&req_user.password, hash);
        let user_db = match user_db {
            Some(user) if verified => user,
            _ => {
                tracing::info!(username = %req_user.username, "login rejected");
                return Err(CustomError::InvalidCredentials);
            }
        };

        let token = self.sessions.create(user_db.id).await?;
        let active_sessions = self.sessions.len().await;
        tracing::info!(
            user_id = user_db.id,
            active_sessions,
            "{} succeed login",
            user_db.username
        );
        Ok(token)
    }

    pub async fn register(&self, req_user: &RegisterRequest) -> Result<i64, CustomError> {
        if req_user.username.is_empty() {
            return Err(CustomError::MissingField("username"));
        }
        if req_user.password.is_empty() {
            return Err(CustomError::MissingField("password"));
        }
        if req_user.confirmation.is_empty() {
            return Err(CustomError::MissingField("confirmation"));
        }
        if self.repository.username_exists(&req_user.username).await? {
            return Err(CustomError::UsernameExists);
        }
        if req_user.password != req_user.confirmation {
            return Err(CustomError::PasswordMismatch);
        }

        let hash = encrypt(&req_user.password)?;
        let id = self
            .repository
            .insert_user(&req_user.username, &hash, self.starting_cash)
            .await?;
        tracing::info!(user_id = id, username = %req_user.username, "user registered");
        Ok(id)
    }

    /// Closes the session named in `headers`, if any.
    pub async fn logout(&self, headers: &HashMap<String, String>) {
        if let Some(token) = extract_token(headers) {
            if self.sessions.revoke(&token).await {
                let active_sessions = self.sessions.len().await;
                tracing::info!(active_sessions, "session closed");
            }
        }
    }

    /// Resolves the caller of a protected route.
    pub async fn authenticate(
        &self,
        headers: &HashMap<String, String>,
    ) -> Result<CurrentUser, CustomError> {
        let token = extract_token(headers).ok_or_else(|| {
            tracing::debug!("Missing session");
            CustomError::Unauthorized
        })?;
        self.sessions.resolve(&token).await
    }
}
