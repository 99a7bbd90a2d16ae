use std::sync::Arc;

use letlog_api::policy::RoutePolicy;
use letlog_api::ratelimit::RateLimiter;
use letlog_api::store::{MemoryProfileStore, PgProfileStore, ProfileStore};
use letlog_api::{app, AppState};

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    let config = letlog_api::config::config();
    tracing::info!("Starting LetLog API in {:?} mode", config.environment);

    let profiles: Arc<dyn ProfileStore> = match std::env::var("DATABASE_URL") {
        Ok(url) => {
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(10)
                .connect(&url)
                .await
                .unwrap_or_else(|e| panic!("failed to connect to database: {}", e));
            Arc::new(PgProfileStore::new(pool))
        }
        Err(_) => {
            tracing::warn!("DATABASE_URL not set, using in-memory profile store");
            Arc::new(MemoryProfileStore::new())
        }
    };

    let limiter = Arc::new(RateLimiter::new());
    // Held until the server exits; dropping it cancels the sweep task
    let _sweeper = limiter.start_sweeper();

    let state = AppState::new(
        Arc::new(RoutePolicy::letlog_default()),
        profiles,
        limiter,
    );
    let app = app(state);

    // Allow tests or deployments to override port via env
    let port = std::env::var("LETLOG_API_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    tracing::info!("LetLog API listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}
