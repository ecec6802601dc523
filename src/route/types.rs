use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::geodesy::Coordinate;
use crate::session::SessionStats;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoutePoint {
    pub coordinate: Coordinate,
    /// m/s, 0 when no speed was known at that point.
    pub speed: f64,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RouteStats {
    pub duration: f64,
    pub distance: f64,
    pub calories: f64,
    pub steps: u64,
    pub average_speed: f64,
}

impl From<&SessionStats> for RouteStats {
    fn from(stats: &SessionStats) -> Self {
        Self {
            duration: stats.duration,
            distance: stats.total_distance,
            calories: stats.calories,
            steps: stats.steps,
            average_speed: stats.average_speed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub id: String,
    pub name: String,
    pub created_at: i64,
    pub stats: RouteStats,
    pub points: Vec<RoutePoint>,
}
