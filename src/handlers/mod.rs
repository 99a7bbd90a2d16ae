pub mod auth;
pub mod billing;
pub mod pages;
pub mod reports;

use axum::Json;
use serde_json::{json, Value};

pub async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "LetLog API",
            "version": version,
            "description": "Property-management backend for UK landlords, tenants and contractors",
            "endpoints": {
                "home": "/ (public)",
                "auth": "/login, /signup, /logout (anonymous only for login/signup pages)",
                "landlord": "/properties, /tenancies, /compliance, /invite (landlord only)",
                "contractor": "/quotes (contractor only)",
                "shared": "/tenders (landlord+contractor), /issues (landlord+tenant)",
                "protected": "/dashboard, /calendar, /settings, /reviews (any signed-in role)",
                "billing": "/api/billing/checkout (protected, rate limited)",
                "reports": "/api/reports/export (protected, rate limited)",
            }
        }
    }))
}

pub async fn health() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "status": "ok",
            "timestamp": chrono::Utc::now(),
        }
    }))
}

/// Fixed 429 body required of every rate-limited endpoint.
pub(crate) fn too_many_requests() -> axum::response::Response {
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    (
        StatusCode::TOO_MANY_REQUESTS,
        Json(json!({ "error": "Too many requests. Please try again later." })),
    )
        .into_response()
}
