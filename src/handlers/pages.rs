// Role-surface page endpoints. Deliberately thin: they exist to sit behind
// the access gate, which guarantees the SessionUser extension is present on
// every protected route.

use axum::{Extension, Json};
use serde_json::{json, Value};

use crate::session::SessionUser;

fn page_payload(page: &str, user: &SessionUser) -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "page": page,
            "viewer": { "id": user.id, "role": user.role },
        }
    }))
}

pub async fn dashboard(Extension(user): Extension<SessionUser>) -> Json<Value> {
    page_payload("dashboard", &user)
}

pub async fn calendar(Extension(user): Extension<SessionUser>) -> Json<Value> {
    page_payload("calendar", &user)
}

pub async fn settings(Extension(user): Extension<SessionUser>) -> Json<Value> {
    page_payload("settings", &user)
}

pub async fn reviews(Extension(user): Extension<SessionUser>) -> Json<Value> {
    page_payload("reviews", &user)
}

// Landlord-exclusive surfaces

pub async fn properties(Extension(user): Extension<SessionUser>) -> Json<Value> {
    page_payload("properties", &user)
}

pub async fn tenancies(Extension(user): Extension<SessionUser>) -> Json<Value> {
    page_payload("tenancies", &user)
}

pub async fn compliance(Extension(user): Extension<SessionUser>) -> Json<Value> {
    page_payload("compliance", &user)
}

pub async fn invite(Extension(user): Extension<SessionUser>) -> Json<Value> {
    page_payload("invite", &user)
}

// Contractor-exclusive surface

pub async fn quotes(Extension(user): Extension<SessionUser>) -> Json<Value> {
    page_payload("quotes", &user)
}

// Shared surfaces

pub async fn tenders(Extension(user): Extension<SessionUser>) -> Json<Value> {
    page_payload("tenders", &user)
}

pub async fn issues(Extension(user): Extension<SessionUser>) -> Json<Value> {
    page_payload("issues", &user)
}
