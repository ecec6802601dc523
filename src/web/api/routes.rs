use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::geodesy::Coordinate;
use crate::route::render::{self, Bounds, RouteSegment};
use crate::route::{Route, RouteStats};
use crate::session::SessionStats;
use crate::storage::TotalStats;
use crate::web::api::error::{ApiResult, ErrorResponse};
use crate::web::auth::{require_permission, AppState, AuthenticatedUser};
use crate::web::config::Permission;

#[derive(Debug, Serialize, ToSchema)]
pub struct RouteSummary {
    pub id: String,
    pub name: String,
    pub created_at: i64,
    pub stats: RouteStats,
    pub point_count: usize,
}

impl From<&Route> for RouteSummary {
    fn from(route: &Route) -> Self {
        RouteSummary {
            id: route.id.clone(),
            name: route.name.clone(),
            created_at: route.created_at,
            stats: route.stats.clone(),
            point_count: route.points.len(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RouteSegmentsResponse {
    pub segments: Vec<RouteSegment>,
    pub center: Option<Coordinate>,
    pub bounds: Option<Bounds>,
}

impl From<&Route> for RouteSegmentsResponse {
    fn from(route: &Route) -> Self {
        RouteSegmentsResponse {
            segments: render::segments(route),
            center: render::center(route),
            bounds: render::bounds(route),
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/routes",
    security(
        ("api_key" = [])
    ),
    responses(
        (status = 200, description = "Saved routes, oldest first", body = Vec<RouteSummary>),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "routes"
)]
pub async fn list_routes(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<Json<Vec<RouteSummary>>> {
    require_permission(&user, Permission::ReadRoutes)?;
    let routes = state.store.get_routes()?;
    Ok(Json(routes.iter().map(RouteSummary::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/routes/{id}",
    params(
        ("id" = String, Path, description = "Route id")
    ),
    security(
        ("api_key" = [])
    ),
    responses(
        (status = 200, description = "Route with all points", body = Route),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Route not found", body = ErrorResponse)
    ),
    tag = "routes"
)]
pub async fn get_route(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Route>> {
    require_permission(&user, Permission::ReadRoutes)?;
    Ok(Json(state.store.get_route(&id)?))
}

#[utoipa::path(
    get,
    path = "/api/routes/{id}/segments",
    params(
        ("id" = String, Path, description = "Route id")
    ),
    security(
        ("api_key" = [])
    ),
    responses(
        (status = 200, description = "Speed-coloured segments and viewport", body = RouteSegmentsResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Route not found", body = ErrorResponse)
    ),
    tag = "routes"
)]
pub async fn route_segments(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> ApiResult<Json<RouteSegmentsResponse>> {
    require_permission(&user, Permission::ReadRoutes)?;
    let route = state.store.get_route(&id)?;
    Ok(Json(RouteSegmentsResponse::from(&route)))
}

#[utoipa::path(
    get,
    path = "/api/stats/last",
    security(
        ("api_key" = [])
    ),
    responses(
        (status = 200, description = "Stats of the last stopped session", body = Option<SessionStats>),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "stats"
)]
pub async fn last_stats(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<Json<Option<SessionStats>>> {
    require_permission(&user, Permission::ReadRoutes)?;
    Ok(Json(state.store.get_last_stats()?))
}

#[utoipa::path(
    get,
    path = "/api/stats/totals",
    security(
        ("api_key" = [])
    ),
    responses(
        (status = 200, description = "Totals across all sessions", body = TotalStats),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "stats"
)]
pub async fn total_stats(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<Json<TotalStats>> {
    require_permission(&user, Permission::ReadRoutes)?;
    Ok(Json(state.store.get_total_stats()?))
}
