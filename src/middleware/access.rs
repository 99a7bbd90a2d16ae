// Edge access gate: session resolution + route classification + decision.
// Every denial is a redirect, never a bare 401/403; anonymous users are
// funnelled through /login with a return path, signed-in users are bounced to
// their own role home.

use axum::{
    extract::{Request, State},
    http::{header::SET_COOKIE, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::policy::{Role, RouteClass};
use crate::session::{SessionUser, SESSION_COOKIE};
use crate::AppState;

const GENERIC_DENIAL: &str = "You do not have access to that page.";

/// Terminal outcome for one request at the gate.
#[derive(Debug, Clone, PartialEq)]
pub enum AccessDecision {
    Allow,
    RedirectToLogin,
    RedirectHome {
        role: Role,
        reason: Option<&'static str>,
    },
}

/// Pure decision over the resolved principal and route classification. The
/// exclusive-role check runs before the allow-list check; no route carries
/// both, they are disjoint rule kinds in the policy table.
pub fn decide(user: Option<&SessionUser>, class: &RouteClass) -> AccessDecision {
    match user {
        None if class.is_protected => AccessDecision::RedirectToLogin,
        Some(user) if class.is_auth_page => AccessDecision::RedirectHome {
            role: user.role,
            reason: None,
        },
        Some(user) if class.is_protected => {
            if let Some(required) = class.exclusive_role {
                if user.role != required {
                    return AccessDecision::RedirectHome {
                        role: user.role,
                        reason: Some(exclusive_denial_reason(required)),
                    };
                }
            } else if let Some(allowed) = class.allowed_roles {
                if !allowed.contains(&user.role) {
                    return AccessDecision::RedirectHome {
                        role: user.role,
                        reason: Some(GENERIC_DENIAL),
                    };
                }
            }
            AccessDecision::Allow
        }
        _ => AccessDecision::Allow,
    }
}

fn exclusive_denial_reason(required: Role) -> &'static str {
    match required {
        Role::Landlord => "This page is only available to landlords.",
        Role::Tenant => "This page is only available to tenants.",
        Role::Contractor => "This page is only available to contractors.",
    }
}

fn login_redirect_target(original_path: &str) -> String {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("redirect", original_path)
        .finish();
    format!("/login?{}", query)
}

fn home_redirect_target(role: Role, reason: Option<&str>) -> String {
    match reason {
        Some(reason) => {
            let query = url::form_urlencoded::Serializer::new(String::new())
                .append_pair("error", reason)
                .finish();
            format!("{}?{}", role.home_page(), query)
        }
        None => role.home_page().to_string(),
    }
}

/// Gate middleware applied to the whole router. Static assets skip it; every
/// other response, redirects included, carries the refreshed session cookie.
pub async fn access_gate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    if state.policy.is_bypassed(&path) {
        return next.run(request).await;
    }

    // Session resolution always precedes the decision, so role gates never
    // run on stale or defaulted data when a real lookup is possible.
    let resolved = state.sessions.resolve(request.headers()).await;
    let class = state.policy.classify(&path);

    let mut response = match decide(resolved.as_ref().map(|r| &r.user), &class) {
        AccessDecision::Allow => {
            if let Some(resolved) = &resolved {
                request.extensions_mut().insert(resolved.user.clone());
            }
            next.run(request).await
        }
        AccessDecision::RedirectToLogin => {
            tracing::debug!("anonymous request to {} redirected to login", path);
            Redirect::to(&login_redirect_target(&path)).into_response()
        }
        AccessDecision::RedirectHome { role, reason } => {
            if reason.is_some() {
                tracing::warn!("role '{}' denied access to {}", role, path);
            } else {
                tracing::debug!("signed-in {} bounced off auth page {}", role, path);
            }
            Redirect::to(&home_redirect_target(role, reason)).into_response()
        }
    };

    if let Some(resolved) = resolved {
        attach_refreshed_cookie(&mut response, &resolved.refreshed_cookie);
    }
    response
}

/// Append the refreshed session cookie unless the handler already set or
/// cleared the session itself (login, signup, logout).
fn attach_refreshed_cookie(response: &mut Response, cookie: &str) {
    let already_set = response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .any(|value| {
            value
                .to_str()
                .map(|v| v.starts_with(SESSION_COOKIE))
                .unwrap_or(false)
        });
    if already_set {
        return;
    }
    match HeaderValue::from_str(cookie) {
        Ok(value) => {
            response.headers_mut().append(SET_COOKIE, value);
        }
        Err(err) => tracing::error!("refreshed session cookie not header-safe: {}", err),
    }
}
