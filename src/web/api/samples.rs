use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::geodesy::Coordinate;
use crate::session::{AccelerationReading, LocationSample};
use crate::web::api::error::{ApiError, ApiResult, ErrorResponse};
use crate::web::auth::{require_permission, AppState, AuthenticatedUser};
use crate::web::config::Permission;

/// A position fix pushed by a client device.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LocationRequest {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub accuracy: Option<f64>,
    #[serde(default)]
    pub speed: Option<f64>,
    /// Unix milliseconds. Defaults to the time of receipt.
    #[serde(default)]
    pub timestamp: Option<i64>,
}

impl LocationRequest {
    fn into_sample(self) -> Result<LocationSample, ApiError> {
        let coordinate = Coordinate::new(self.latitude, self.longitude)
            .map_err(|e| ApiError::Validation(e.to_string()))?;
        Ok(LocationSample {
            coordinate,
            accuracy: self.accuracy,
            speed: self.speed,
            timestamp: self
                .timestamp
                .unwrap_or_else(|| chrono::Utc::now().timestamp_millis()),
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SampleAccepted {
    pub accepted: bool,
}

#[utoipa::path(
    post,
    path = "/api/samples/location",
    request_body = LocationRequest,
    security(
        ("api_key" = [])
    ),
    responses(
        (status = 200, description = "Sample queued", body = SampleAccepted),
        (status = 400, description = "Coordinate out of range", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 409, description = "No active session", body = ErrorResponse)
    ),
    tag = "samples"
)]
pub async fn push_location(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<LocationRequest>,
) -> ApiResult<Json<SampleAccepted>> {
    require_permission(&user, Permission::PushSamples)?;
    let sample = request.into_sample()?;
    if !state.positions.push(sample) {
        return Err(ApiError::Conflict("session_not_active"));
    }
    Ok(Json(SampleAccepted { accepted: true }))
}

#[utoipa::path(
    post,
    path = "/api/samples/acceleration",
    request_body = AccelerationReading,
    security(
        ("api_key" = [])
    ),
    responses(
        (status = 200, description = "Reading queued for the next motion tick", body = SampleAccepted),
        (status = 400, description = "Non-finite component", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 409, description = "No active session", body = ErrorResponse)
    ),
    tag = "samples"
)]
pub async fn push_acceleration(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(reading): Json<AccelerationReading>,
) -> ApiResult<Json<SampleAccepted>> {
    require_permission(&user, Permission::PushSamples)?;
    if !reading.magnitude().is_finite() {
        return Err(ApiError::Validation("acceleration must be finite".into()));
    }
    if !state.tracker.lock().await.is_running() {
        return Err(ApiError::Conflict("session_not_active"));
    }
    state.motion.push(reading);
    Ok(Json(SampleAccepted { accepted: true }))
}
