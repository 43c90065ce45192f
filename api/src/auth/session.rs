//! Cookie sessions backed by redis.

use std::sync::Arc;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use redis::{aio::MultiplexedConnection, AsyncCommands};
use uuid::Uuid;

use crate::{error::AppError, state::AppState};

pub const SESSION_COOKIE: &str = "session_token";

#[derive(Clone)]
pub struct SessionStore {
    conn: MultiplexedConnection,
    ttl_secs: u64,
}

fn session_key(token: &str) -> String {
    format!("session:{}", token)
}

fn user_sessions_key(user_id: i64) -> String {
    format!("user_sessions:{}", user_id)
}

impl SessionStore {
    pub fn new(conn: MultiplexedConnection, ttl_secs: u64) -> Self {
        Self { conn, ttl_secs }
    }

    pub async fn create(&self, user_id: i64) -> Result<String, redis::RedisError> {
        let token = Uuid::new_v4().simple().to_string();
        let mut conn = self.conn.clone();
        let _: () = conn.set_ex(session_key(&token), user_id, self.ttl_secs).await?;
        let _: () = conn.sadd(user_sessions_key(user_id), &token).await?;
        let _: () = conn.expire(user_sessions_key(user_id), self.ttl_secs as i64).await?;
        Ok(token)
    }

    pub async fn resolve(&self, token: &str) -> Result<Option<i64>, redis::RedisError> {
        let mut conn = self.conn.clone();
        conn.get(session_key(token)).await
    }

    pub async fn revoke(&self, user_id: i64, token: &str) -> Result<(), redis::RedisError> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(session_key(token)).await?;
        let _: () = conn.srem(user_sessions_key(user_id), token).await?;
        Ok(())
    }

    /// Drops every session of the account (password change, account deletion).
    pub async fn revoke_all(&self, user_id: i64) -> Result<(), redis::RedisError> {
        let mut conn = self.conn.clone();
        let tokens: Vec<String> = conn.smembers(user_sessions_key(user_id)).await?;
        for token in &tokens {
            let _: () = conn.del(session_key(token)).await?;
        }
        let _: () = conn.del(user_sessions_key(user_id)).await?;
        Ok(())
    }
}

/// Browser-session cookie; the server-side entry expires after the store TTL.
pub fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .build()
}

pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, "")).path("/").build()
}

/// The authenticated caller. Rejects with 401 when the cookie is missing or
/// the session is unknown.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: i64,
    pub token: String,
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar
            .get(SESSION_COOKIE)
            .map(|c| c.value().to_owned())
            .filter(|t| !t.is_empty())
            .ok_or(AppError::Unauthorized)?;

        let id = state
            .sessions
            .resolve(&token)
            .await?
            .ok_or(AppError::Unauthorized)?;

        Ok(CurrentUser { id, token })
    }
}
