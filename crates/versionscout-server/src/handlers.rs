// Request handlers for the stats API
use crate::{error::ApiError, security::client_ip, AppState};
use axum::{
    extract::{ConnectInfo, Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::net::SocketAddr;
use tracing::{error, warn};
use versionscout_core::{is_valid_username, truncate_report_descriptions, StatsResponse};

/// GET /api/stats/:username
pub async fn get_stats(
    State(state): State<AppState>,
    Path(username): Path<String>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
) -> Result<Json<StatsResponse>, ApiError> {
    let ip = client_ip(&headers, peer.map(|ConnectInfo(addr)| addr), state.behind_proxy);
    if !state.stats_limiter.check(&ip).await {
        warn!(event = "RATE_LIMITED", "Stats quota exceeded for {}", ip);
        return Err(ApiError::RateLimited);
    }

    if !is_valid_username(&username) {
        warn!(event = "INVALID_USERNAME", "Invalid username from {}: {:?}", ip, username);
        return Err(ApiError::InvalidUsername);
    }

    let mut response = state.service.stats(&username).await.map_err(|e| {
        error!("Error fetching stats for {}: {}", username, e);
        ApiError::from(e)
    })?;

    truncate_report_descriptions(&mut response.report);
    Ok(Json(response))
}

/// GET /api/refresh/:username
pub async fn refresh_stats(
    State(state): State<AppState>,
    Path(username): Path<String>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let ip = client_ip(&headers, peer.map(|ConnectInfo(addr)| addr), state.behind_proxy);
    if !state.refresh_limiter.check(&ip).await {
        warn!(event = "RATE_LIMITED", "Refresh quota exceeded for {}", ip);
        return Err(ApiError::RateLimited);
    }

    if !is_valid_username(&username) {
        warn!(event = "INVALID_USERNAME", "Invalid username from {}: {:?}", ip, username);
        return Err(ApiError::InvalidUsername);
    }

    // Failure details stay in the log; clients get a fixed message
    match state.service.refresh(&username).await {
        Ok(()) => Ok(Json(json!({ "status": "success", "message": "Data refreshed" }))
            .into_response()),
        Err(e) => {
            error!("Error refreshing data for {}: {}", username, e);
            Ok((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "status": "error", "message": "Unable to refresh data" })),
            )
                .into_response())
        }
    }
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "OK"
}

pub async fn not_found() -> ApiError {
    ApiError::NotFound
}
