#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use uuid::Uuid;

use letlog_api::policy::{Role, RoutePolicy};
use letlog_api::ratelimit::RateLimiter;
use letlog_api::session::{generate_session_token, Claims};
use letlog_api::store::MemoryProfileStore;
use letlog_api::{app, AppState};

/// Build the full router over an in-memory profile store. The state behind
/// the returned router is shared across clones, so repeated `oneshot` calls
/// hit the same rate limiter.
pub fn test_app(profiles: Arc<MemoryProfileStore>) -> Router {
    let state = AppState::new(
        Arc::new(RoutePolicy::letlog_default()),
        profiles,
        Arc::new(RateLimiter::new()),
    );
    app(state)
}

/// Cookie header value for a freshly minted session.
pub fn session_cookie_for(principal_id: Uuid) -> String {
    let claims = Claims::new(principal_id, Some("test@example.co.uk".to_string()));
    let token = generate_session_token(&claims).expect("session token");
    format!("letlog_session={}", token)
}

/// App plus a session cookie whose principal has the given stored role.
pub fn signed_in_app(role: Role) -> (Router, String) {
    let principal_id = Uuid::new_v4();
    let profiles = Arc::new(MemoryProfileStore::new().with_role(principal_id, role));
    (test_app(profiles), session_cookie_for(principal_id))
}
