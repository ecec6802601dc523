use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::sample::ActivityLogEntry;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    pub start_time: i64,
    /// Zero while the session is active.
    pub end_time: i64,
    /// Seconds.
    pub duration: f64,
    /// Metres.
    pub total_distance: f64,
    pub steps: u64,
    pub calories: f64,
    /// Metres per second.
    pub average_speed: f64,
    #[serde(default)]
    pub log_ids: Vec<u64>,
}

/// Frozen result of a stopped session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FinishedSession {
    pub stats: SessionStats,
    pub log: Vec<ActivityLogEntry>,
}
