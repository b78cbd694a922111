use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::Rng;
use rand::distributions::Alphanumeric;
use tokio::sync::RwLock;

use super::model::{Claims, CurrentUser};
use crate::error::CustomError;

struct SessionEntry {
    user_id: i64,
    expires_at: DateTime<Utc>,
}

/// Server-side session table. Clients hold a signed token naming a session
/// id; the session is only valid while its id is present here.
pub struct SessionStore {
    sessions: RwLock<HashMap<String, SessionEntry>>,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        SessionStore {
            sessions: RwLock::new(HashMap::new()),
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    pub async fn create(&self, user_id: i64) -> Result<String, CustomError> {
        let session_id: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(32)
            .map(char::from)
            .collect();
        let expires_at = Utc::now() + self.ttl;

        let claims = Claims {
            sub: user_id.to_string(),
            sid: session_id.clone(),
            exp: expires_at.timestamp() as usize,
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(CustomError::TokenError)?;

        let mut sessions = self.sessions.write().await;
        let now = Utc::now();
        sessions.retain(|_, entry| entry.expires_at > now);
        sessions.insert(
            session_id,
            SessionEntry {
                user_id,
                expires_at,
            },
        );
        Ok(token)
    }

    pub async fn resolve(&self, token: &str) -> Result<CurrentUser, CustomError> {
        let claims = self.verify(token)?;
        let user_id: i64 = claims.sub.parse().map_err(|_| CustomError::Unauthorized)?;

        let sessions = self.sessions.read().await;
        match sessions.get(&claims.sid) {
            Some(entry) if entry.user_id == user_id && entry.expires_at > Utc::now() => {
                Ok(CurrentUser {
                    user_id,
                    session_id: claims.sid,
                })
            }
            _ => Err(CustomError::Unauthorized),
        }
    }

    /// Removes the session behind `token`. Unknown or invalid tokens are ignored.
    pub async fn revoke(&self, token: &str) -> bool {
        match self.verify(token) {
            Ok(claims) => self.sessions.write().await.remove(&claims.sid).is_some(),
            Err(_) => false,
        }
    }

    /// Number of sessions held, expired ones included until the next sweep.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    fn verify(&self, token: &str) -> Result<Claims, CustomError> {
        decode::<Claims>(
            token,
            &self.decoding_key,
            &Validation::new(Algorithm::HS256),
        )
        .map(|data| data.claims)
        .map_err(|e| {
            tracing::debug!("Verification failed: {}", e);
            CustomError::Unauthorized
        })
    }
}
