use chrono::{DateTime, Utc};

use crate::session::{ActivityLogEntry, SessionStats};

use super::types::{Route, RoutePoint, RouteStats};

/// A single valid fix is enough for a (degenerate) route.
pub const MIN_ROUTE_POINTS: usize = 1;

pub struct RouteBuilder;

impl RouteBuilder {
    /// Compacts a finished session into a route. `None` means there was
    /// nothing worth saving, which is not an error.
    pub fn build(log: &[ActivityLogEntry], stats: &SessionStats) -> Option<Route> {
        if log.is_empty() {
            return None;
        }

        let mut points: Vec<RoutePoint> = log
            .iter()
            .filter_map(|entry| {
                let location = entry.location.as_ref()?;
                let coordinate = location.coordinate;
                if !coordinate.is_valid() || coordinate.is_null_island() {
                    return None;
                }
                Some(RoutePoint {
                    coordinate,
                    speed: entry.speed.filter(|s| s.is_finite()).unwrap_or(0.0),
                    timestamp: entry.timestamp,
                })
            })
            .collect();

        if points.len() < MIN_ROUTE_POINTS {
            return None;
        }
        points.sort_by_key(|p| p.timestamp);

        let start = DateTime::<Utc>::from_timestamp_millis(stats.start_time).unwrap_or_default();

        Some(Route {
            id: generate_id(start),
            name: format!("Route {}", start.format("%Y-%m-%d %H:%M:%S UTC")),
            created_at: stats.start_time,
            stats: RouteStats::from(stats),
            points,
        })
    }
}

fn generate_id(start: DateTime<Utc>) -> String {
    let uuid = uuid::Uuid::new_v4();
    let timestamp = start.format("%Y%m%dT%H%M%SZ");
    format!("route-{}_{}", timestamp, uuid)
}
