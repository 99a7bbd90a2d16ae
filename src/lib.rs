pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod policy;
pub mod ratelimit;
pub mod session;
pub mod store;

use std::sync::Arc;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use policy::RoutePolicy;
use ratelimit::RateLimiter;
use session::SessionResolver;
use store::ProfileStore;

/// Shared service state. Everything here is constructed once in `main` (or a
/// test harness) and handed to call sites by handle; no ambient statics
/// besides the config singleton.
#[derive(Clone)]
pub struct AppState {
    pub policy: Arc<RoutePolicy>,
    pub sessions: Arc<SessionResolver>,
    pub profiles: Arc<dyn ProfileStore>,
    pub limiter: Arc<RateLimiter>,
}

impl AppState {
    pub fn new(
        policy: Arc<RoutePolicy>,
        profiles: Arc<dyn ProfileStore>,
        limiter: Arc<RateLimiter>,
    ) -> Self {
        let sessions = Arc::new(SessionResolver::new(Arc::clone(&profiles)));
        Self {
            policy,
            sessions,
            profiles,
            limiter,
        }
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        // Public
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .merge(auth_routes())
        .merge(page_routes())
        .merge(api_routes())
        // Gate first, then the outer observability layers
        .layer(from_fn_with_state(state.clone(), middleware::access_gate))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn auth_routes() -> Router<AppState> {
    use handlers::auth;

    Router::new()
        .route("/login", get(auth::login_page).post(auth::login_post))
        .route("/signup", get(auth::signup_page).post(auth::signup_post))
        .route("/logout", post(auth::logout_post))
}

fn page_routes() -> Router<AppState> {
    use handlers::pages;

    Router::new()
        // Any signed-in role
        .route("/dashboard", get(pages::dashboard))
        .route("/calendar", get(pages::calendar))
        .route("/settings", get(pages::settings))
        .route("/reviews", get(pages::reviews))
        // Landlord only
        .route("/properties", get(pages::properties))
        .route("/tenancies", get(pages::tenancies))
        .route("/compliance", get(pages::compliance))
        .route("/invite", get(pages::invite))
        // Contractor only
        .route("/quotes", get(pages::quotes))
        // Enumerated allow-lists
        .route("/tenders", get(pages::tenders))
        .route("/issues", get(pages::issues))
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/api/billing/checkout", post(handlers::billing::checkout_post))
        .route("/api/reports/export", post(handlers::reports::export_post))
}
