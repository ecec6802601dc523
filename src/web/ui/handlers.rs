use axum::{
    extract::{Path, State},
    response::IntoResponse,
};

use serde::Serialize;

use crate::route::render;
use crate::storage::StorageError;
use crate::tracker::TrackerMode;
use crate::web::api::error::ApiResult;
use crate::web::auth::AppState;

use super::templates::{DashboardTemplate, RouteRow, RouteTemplate};

fn format_duration(seconds: f64) -> String {
    let secs = if seconds.is_finite() && seconds > 0.0 {
        seconds.round() as u64
    } else {
        0
    };
    humantime::format_duration(std::time::Duration::from_secs(secs)).to_string()
}

fn to_json<T: Serialize>(value: &T) -> Result<String, StorageError> {
    Ok(serde_json::to_string(value)?)
}

fn km(meters: f64) -> String {
    format!("{:.2}", meters / 1000.0)
}

pub async fn dashboard(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let status = state.tracker.lock().await.status();
    let totals = state.store.get_total_stats()?;
    let routes = state.store.get_routes()?;

    let session = &status.session;
    Ok(DashboardTemplate {
        mode: match status.mode {
            TrackerMode::Idle => "idle".to_string(),
            TrackerMode::Running { start } => {
                format!("running since {}", start.format("%H:%M:%S UTC"))
            }
        },
        activity: session.current.activity.to_string(),
        confidence: format!("{:.0}%", session.current.confidence * 100.0),
        distance_m: format!("{:.1}", session.stats.total_distance),
        duration: format_duration(session.stats.duration),
        steps: session.stats.steps,
        total_sessions: totals.total_sessions,
        total_distance_km: km(totals.total_distance),
        total_duration: format_duration(totals.total_duration),
        routes: routes
            .iter()
            .rev()
            .map(|r| RouteRow {
                id: r.id.clone(),
                name: r.name.clone(),
                distance_km: km(r.stats.distance),
                duration: format_duration(r.stats.duration),
                points: r.points.len(),
            })
            .collect(),
    })
}

pub async fn route(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let route = state.store.get_route(&id)?;
    let points: Vec<[f64; 2]> = route
        .points
        .iter()
        .map(|p| [p.coordinate.latitude, p.coordinate.longitude])
        .collect();

    Ok(RouteTemplate {
        name: route.name.clone(),
        distance_km: km(route.stats.distance),
        duration: format_duration(route.stats.duration),
        average_speed: format!("{:.2}", route.stats.average_speed),
        steps: route.stats.steps,
        segments_json: to_json(&render::segments(&route))?,
        points_json: to_json(&points)?,
        bounds_json: to_json(&render::bounds(&route))?,
    })
}
