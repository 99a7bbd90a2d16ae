use std::sync::Arc;

use axum::http::HeaderMap;

use crate::policy::Role;
use crate::store::{ProfileStore, StoreError};

use super::{generate_session_token, session_cookie, session_token_from_headers,
    validate_session_token, Claims, SessionUser};

/// Outcome of resolving a request's credentials: the authenticated user plus
/// the refreshed Set-Cookie value that must ride on the outgoing response,
/// redirects included.
#[derive(Debug, Clone)]
pub struct ResolvedSession {
    pub user: SessionUser,
    pub refreshed_cookie: String,
}

/// Resolves zero or one principal per request from the session cookie, then
/// attaches the stored role from the profile store.
pub struct SessionResolver {
    profiles: Arc<dyn ProfileStore>,
}

impl SessionResolver {
    pub fn new(profiles: Arc<dyn ProfileStore>) -> Self {
        Self { profiles }
    }

    /// Anonymous requests (no cookie, malformed token, expired token) resolve
    /// to `None`; authentication itself is fail-closed. Role lookup is the
    /// opposite: see `default_role`.
    pub async fn resolve(&self, headers: &HeaderMap) -> Option<ResolvedSession> {
        let token = session_token_from_headers(headers)?;
        let claims = match validate_session_token(&token) {
            Ok(claims) => claims,
            Err(err) => {
                tracing::debug!("rejecting session token: {}", err);
                return None;
            }
        };

        let role = default_role(self.profiles.role_for(claims.sub).await);

        // Re-mint with a fresh expiry so active sessions keep sliding
        let refreshed = Claims::new(claims.sub, claims.email.clone());
        let refreshed_cookie = match generate_session_token(&refreshed) {
            Ok(token) => session_cookie(&token),
            Err(err) => {
                tracing::error!("failed to refresh session token: {}", err);
                session_cookie(&token)
            }
        };

        Some(ResolvedSession {
            user: SessionUser {
                id: claims.sub,
                email: claims.email,
                role,
            },
            refreshed_cookie,
        })
    }
}

/// Fail-open role defaulting: a missing profile row and a profile-store
/// failure both resolve to `Landlord` instead of blocking the request. This
/// is deliberate policy, kept in one place so it stays auditable.
pub fn default_role(looked_up: Result<Option<Role>, StoreError>) -> Role {
    match looked_up {
        Ok(Some(role)) => role,
        Ok(None) => Role::Landlord,
        Err(err) => {
            tracing::warn!("role lookup failed, defaulting to landlord: {}", err);
            Role::Landlord
        }
    }
}
