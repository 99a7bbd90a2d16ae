// Session issuance edge. Credential verification proper belongs to the auth
// collaborator; these handlers mint/clear the session cookie and hand the
// caller its role home.

use std::collections::HashMap;

use axum::{
    extract::{Query, State},
    http::header::SET_COOKIE,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::ApiError;
use crate::policy::Role;
use crate::session::{clear_session_cookie, default_role, generate_session_token, session_cookie, Claims};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub role: Role,
}

/// GET /login - anonymous-only page. The gate bounces signed-in users before
/// this handler runs. Echoes the `redirect` and `error` query params the gate
/// attaches so the page can render them.
pub async fn login_page(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "page": "login",
            "redirect": params.get("redirect"),
            "error": params.get("error"),
        }
    }))
}

/// GET /signup - anonymous-only page.
pub async fn signup_page() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": { "page": "signup" }
    }))
}

/// POST /login - issue a session cookie for the principal.
pub async fn login_post(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Response, ApiError> {
    if body.email.trim().is_empty() || body.password.is_empty() {
        return Err(ApiError::bad_request("Email and password are required"));
    }

    let principal_id = Uuid::new_v4();
    let role = default_role(state.profiles.role_for(principal_id).await);

    let claims = Claims::new(principal_id, Some(body.email.clone()));
    let token = generate_session_token(&claims)?;

    tracing::debug!("session issued for {} as {}", principal_id, role);

    Ok((
        [(SET_COOKIE, session_cookie(&token))],
        Json(json!({
            "success": true,
            "data": {
                "user": { "id": principal_id, "email": body.email, "role": role },
                "home": role.home_page(),
            }
        })),
    )
        .into_response())
}

/// POST /signup - create the profile row with the chosen role, then issue a
/// session cookie.
pub async fn signup_post(
    State(state): State<AppState>,
    Json(body): Json<SignupRequest>,
) -> Result<Response, ApiError> {
    if body.email.trim().is_empty() || body.password.is_empty() {
        return Err(ApiError::bad_request("Email and password are required"));
    }

    let principal_id = Uuid::new_v4();
    state.profiles.set_role(principal_id, body.role).await?;

    let claims = Claims::new(principal_id, Some(body.email.clone()));
    let token = generate_session_token(&claims)?;

    tracing::info!("new {} profile {} registered", body.role, principal_id);

    Ok((
        [(SET_COOKIE, session_cookie(&token))],
        Json(json!({
            "success": true,
            "data": {
                "user": { "id": principal_id, "email": body.email, "role": body.role },
                "home": body.role.home_page(),
            }
        })),
    )
        .into_response())
}

/// POST /logout - clear the session cookie.
pub async fn logout_post() -> Response {
    (
        [(SET_COOKIE, clear_session_cookie())],
        Json(json!({
            "success": true,
            "data": { "status": "signed_out" }
        })),
    )
        .into_response()
}
