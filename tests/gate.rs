mod common;

use anyhow::Result;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use letlog_api::policy::Role;

async fn body_json(response: axum::response::Response) -> Result<serde_json::Value> {
    let bytes = response.into_body().collect().await?.to_bytes();
    Ok(serde_json::from_slice(&bytes)?)
}

#[tokio::test]
async fn anonymous_on_protected_route_redirects_to_login() -> Result<()> {
    let (app, _) = common::signed_in_app(Role::Landlord);

    for path in ["/dashboard", "/properties", "/tenders/4", "/settings"] {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(path).body(Body::empty())?)
            .await?;

        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{path}");
        let location = response.headers()[header::LOCATION].to_str()?;
        assert!(
            location.starts_with("/login?redirect="),
            "{path} redirected to {location}"
        );
    }
    Ok(())
}

#[tokio::test]
async fn login_redirect_preserves_return_path() -> Result<()> {
    let (app, _) = common::signed_in_app(Role::Landlord);

    let response = app
        .oneshot(Request::builder().uri("/properties/2").body(Body::empty())?)
        .await?;

    assert_eq!(
        response.headers()[header::LOCATION].to_str()?,
        "/login?redirect=%2Fproperties%2F2"
    );
    Ok(())
}

#[tokio::test]
async fn anonymous_on_public_routes_is_allowed() -> Result<()> {
    let (app, _) = common::signed_in_app(Role::Landlord);

    for path in ["/", "/health", "/login", "/signup"] {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(path).body(Body::empty())?)
            .await?;
        assert_eq!(response.status(), StatusCode::OK, "{path}");
    }
    Ok(())
}

#[tokio::test]
async fn unmatched_path_is_not_gated() -> Result<()> {
    let (app, _) = common::signed_in_app(Role::Landlord);

    // `/issues2` must not match the `/issues` rule; with no route behind it
    // the gate lets it fall through to a plain 404, never a redirect
    let response = app
        .oneshot(Request::builder().uri("/issues2").body(Body::empty())?)
        .await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn signed_in_user_bounced_off_auth_pages() -> Result<()> {
    let (app, cookie) = common::signed_in_app(Role::Contractor);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/login")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())?,
        )
        .await?;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION].to_str()?, "/quotes");
    Ok(())
}

#[tokio::test]
async fn tenant_denied_landlord_exclusive_route() -> Result<()> {
    let (app, cookie) = common::signed_in_app(Role::Tenant);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/properties")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())?,
        )
        .await?;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers()[header::LOCATION].to_str()?,
        "/issues?error=This+page+is+only+available+to+landlords."
    );
    Ok(())
}

#[tokio::test]
async fn tenant_denied_enumerated_route_with_generic_reason() -> Result<()> {
    let (app, cookie) = common::signed_in_app(Role::Tenant);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/tenders")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())?,
        )
        .await?;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers()[header::LOCATION].to_str()?,
        "/issues?error=You+do+not+have+access+to+that+page."
    );
    Ok(())
}

#[tokio::test]
async fn contractor_allowed_on_tenders() -> Result<()> {
    let (app, cookie) = common::signed_in_app(Role::Contractor);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/tenders")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())?,
        )
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await?;
    assert_eq!(body["data"]["page"], "tenders");
    assert_eq!(body["data"]["viewer"]["role"], "contractor");
    Ok(())
}

#[tokio::test]
async fn session_cookie_refreshed_on_allowed_response() -> Result<()> {
    let (app, cookie) = common::signed_in_app(Role::Landlord);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/dashboard")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())?,
        )
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let set_cookie = response.headers()[header::SET_COOKIE].to_str()?;
    assert!(set_cookie.starts_with("letlog_session="));
    assert!(set_cookie.contains("HttpOnly"));
    Ok(())
}

#[tokio::test]
async fn session_cookie_refreshed_even_on_denial_redirect() -> Result<()> {
    let (app, cookie) = common::signed_in_app(Role::Tenant);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/compliance")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())?,
        )
        .await?;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let set_cookie = response.headers()[header::SET_COOKIE].to_str()?;
    assert!(set_cookie.starts_with("letlog_session="));
    Ok(())
}

#[tokio::test]
async fn unknown_principal_defaults_to_landlord() -> Result<()> {
    // Session is valid but no profile row exists: fail-open to landlord
    let profiles = std::sync::Arc::new(letlog_api::store::MemoryProfileStore::new());
    let app = common::test_app(profiles);
    let cookie = common::session_cookie_for(uuid::Uuid::new_v4());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/properties")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())?,
        )
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await?;
    assert_eq!(body["data"]["viewer"]["role"], "landlord");
    Ok(())
}

#[tokio::test]
async fn login_page_echoes_gate_query_params() -> Result<()> {
    let (app, _) = common::signed_in_app(Role::Landlord);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/login?redirect=%2Fdashboard&error=denied")
                .body(Body::empty())?,
        )
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await?;
    assert_eq!(body["data"]["redirect"], "/dashboard");
    assert_eq!(body["data"]["error"], "denied");
    Ok(())
}

#[tokio::test]
async fn anonymous_api_request_is_redirected_not_401() -> Result<()> {
    let (app, _) = common::signed_in_app(Role::Landlord);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/billing/checkout")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{}"))?,
        )
        .await?;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    Ok(())
}
