// Cookie-borne session tokens. The session cookie carries an HS256 JWT; the
// gate re-mints it on every response so a near-expiry session keeps sliding.

pub mod resolver;

pub use resolver::{default_role, ResolvedSession, SessionResolver};

use axum::http::HeaderMap;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config;
use crate::policy::Role;

pub const SESSION_COOKIE: &str = "letlog_session";

/// Session claims carried in the cookie JWT.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: Option<String>,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn new(principal_id: Uuid, email: Option<String>) -> Self {
        let now = Utc::now();
        let ttl_hours = config::config().security.session_ttl_hours;
        Self {
            sub: principal_id,
            email,
            iat: now.timestamp(),
            exp: (now + Duration::hours(ttl_hours as i64)).timestamp(),
        }
    }
}

/// Authenticated principal with its resolved role, injected into request
/// extensions for downstream handlers.
#[derive(Debug, Clone)]
pub struct SessionUser {
    pub id: Uuid,
    pub email: Option<String>,
    pub role: Role,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session secret not configured")]
    MissingSecret,
    #[error("token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

pub fn generate_session_token(claims: &Claims) -> Result<String, SessionError> {
    let secret = &config::config().security.jwt_secret;
    if secret.is_empty() {
        return Err(SessionError::MissingSecret);
    }
    let token = encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;
    Ok(token)
}

pub fn validate_session_token(token: &str) -> Result<Claims, SessionError> {
    let secret = &config::config().security.jwt_secret;
    if secret.is_empty() {
        return Err(SessionError::MissingSecret);
    }
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(data.claims)
}

/// Pull the session token out of the Cookie header, if present.
pub fn session_token_from_headers(headers: &HeaderMap) -> Option<String> {
    let cookies = headers.get("cookie")?.to_str().ok()?;
    for pair in cookies.split(';') {
        let pair = pair.trim();
        if let Some(value) = pair.strip_prefix(SESSION_COOKIE) {
            if let Some(token) = value.strip_prefix('=') {
                if !token.is_empty() {
                    return Some(token.to_string());
                }
            }
        }
    }
    None
}

/// Set-Cookie value for a freshly minted session token.
pub fn session_cookie(token: &str) -> String {
    let ttl_hours = config::config().security.session_ttl_hours;
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE,
        token,
        ttl_hours * 3600
    )
}

/// Set-Cookie value that clears the session (logout).
pub fn clear_session_cookie() -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE)
}
