use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::session::{ActivityLogEntry, SessionStats};
use crate::storage::TotalStats;
use crate::tracker::{TrackerMode, TrackerStatus};
use crate::web::api::error::{ApiResult, ErrorResponse};
use crate::web::auth::{require_permission, AppState, AuthenticatedUser};
use crate::web::config::Permission;

#[derive(Debug, Serialize, ToSchema)]
pub struct StopResponse {
    pub stats: SessionStats,
    /// Id of the saved route, if the session produced one.
    pub route_id: Option<String>,
    /// Updated totals, absent when persisting failed.
    pub totals: Option<TotalStats>,
    pub save_error: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/session/start",
    security(
        ("api_key" = [])
    ),
    responses(
        (status = 200, description = "Session started", body = TrackerMode),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Sensor permission denied", body = ErrorResponse),
        (status = 409, description = "Session already active", body = ErrorResponse)
    ),
    tag = "session"
)]
pub async fn start(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<Json<TrackerMode>> {
    require_permission(&user, Permission::ControlSession)?;
    let mut tracker = state.tracker.lock().await;
    let mode = tracker.start()?;
    log::info!("Session started by {}", user.name);
    Ok(Json(mode))
}

#[utoipa::path(
    post,
    path = "/api/session/stop",
    security(
        ("api_key" = [])
    ),
    responses(
        (status = 200, description = "Session stopped", body = StopResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 409, description = "No active session", body = ErrorResponse)
    ),
    tag = "session"
)]
pub async fn stop(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<Json<StopResponse>> {
    require_permission(&user, Permission::ControlSession)?;
    let mut tracker = state.tracker.lock().await;
    let outcome = tracker.stop().await?;
    log::info!(
        "Session stopped by {}: {:.1} m in {:.0} s",
        user.name,
        outcome.session.stats.total_distance,
        outcome.session.stats.duration
    );

    Ok(Json(StopResponse {
        stats: outcome.session.stats,
        route_id: outcome.route.map(|r| r.id),
        totals: outcome.totals,
        save_error: outcome.save_error.map(|e| e.to_string()),
    }))
}

#[utoipa::path(
    get,
    path = "/api/session/status",
    security(
        ("api_key" = [])
    ),
    responses(
        (status = 200, description = "Tracker status", body = TrackerStatus),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "session"
)]
pub async fn status(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
) -> ApiResult<Json<TrackerStatus>> {
    let tracker = state.tracker.lock().await;
    Ok(Json(tracker.status()))
}

#[utoipa::path(
    get,
    path = "/api/session/log",
    security(
        ("api_key" = [])
    ),
    responses(
        (status = 200, description = "Activity log of the active session", body = Vec<ActivityLogEntry>),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "session"
)]
pub async fn log(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
) -> ApiResult<Json<Vec<ActivityLogEntry>>> {
    let tracker = state.tracker.lock().await;
    Ok(Json(tracker.log()))
}
