//! Web API for VersionScout
//!
//! Serves cached per-user reports as JSON with per-IP rate limits.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod security;

pub use error::ApiError;
pub use routes::create_router;
pub use security::RateLimiter;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use versionscout_core::{config::ServerConfig, CachedStatsService};

/// How often idle rate-limit buckets are swept
const LIMITER_CLEANUP_INTERVAL: Duration = Duration::from_secs(300);

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub service: CachedStatsService,
    pub stats_limiter: Arc<RateLimiter>,
    pub refresh_limiter: Arc<RateLimiter>,
    pub behind_proxy: bool,
}

impl AppState {
    pub fn new(service: CachedStatsService, config: &ServerConfig) -> Self {
        Self {
            service,
            stats_limiter: Arc::new(RateLimiter::per_minute(config.stats_per_minute)),
            refresh_limiter: Arc::new(RateLimiter::per_minute(config.refresh_per_minute)),
            behind_proxy: config.behind_proxy,
        }
    }
}

/// Bind and serve until the process is stopped
pub async fn run_server(config: &ServerConfig, service: CachedStatsService) -> anyhow::Result<()> {
    let state = AppState::new(service, config);

    let stats_limiter = state.stats_limiter.clone();
    let refresh_limiter = state.refresh_limiter.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(LIMITER_CLEANUP_INTERVAL);
        loop {
            ticker.tick().await;
            stats_limiter.cleanup(LIMITER_CLEANUP_INTERVAL).await;
            refresh_limiter.cleanup(LIMITER_CLEANUP_INTERVAL).await;
        }
    });

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("Listening on {}", listener.local_addr()?);
    if config.behind_proxy {
        info!("Trusting X-Forwarded-For for client addresses");
    }

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;
    Ok(())
}
