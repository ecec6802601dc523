//! What a map renderer needs from a route: per-segment speed, a colour scale
//! and a viewport.

use serde::Serialize;
use utoipa::ToSchema;

use crate::geodesy::Coordinate;

use super::types::Route;

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct RouteSegment {
    pub from: Coordinate,
    pub to: Coordinate,
    pub speed: f64,
    pub color: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct Bounds {
    pub south_west: Coordinate,
    pub north_east: Coordinate,
}

/// Speed bands in m/s, slowest first.
const SPEED_COLORS: [(f64, &str); 4] = [
    (1.0, "#00e1ff"),
    (2.5, "#00ff85"),
    (4.0, "#ffe700"),
    (7.0, "#ff6f00"),
];
const FASTEST_COLOR: &str = "#ff0033";

pub fn speed_color(speed: f64) -> &'static str {
    SPEED_COLORS
        .iter()
        .find(|(limit, _)| speed < *limit)
        .map(|(_, color)| *color)
        .unwrap_or(FASTEST_COLOR)
}

pub fn segments(route: &Route) -> Vec<RouteSegment> {
    route
        .points
        .windows(2)
        .map(|pair| {
            let (a, b) = (&pair[0], &pair[1]);
            let speed = if b.speed > 0.0 {
                b.speed
            } else if a.speed > 0.0 {
                a.speed
            } else {
                0.0
            };
            RouteSegment {
                from: a.coordinate,
                to: b.coordinate,
                speed,
                color: speed_color(speed).to_string(),
            }
        })
        .collect()
}

pub fn center(route: &Route) -> Option<Coordinate> {
    if route.points.is_empty() {
        return None;
    }
    let n = route.points.len() as f64;
    let (lat, lon) = route.points.iter().fold((0.0, 0.0), |(lat, lon), p| {
        (lat + p.coordinate.latitude, lon + p.coordinate.longitude)
    });
    Some(Coordinate {
        latitude: lat / n,
        longitude: lon / n,
    })
}

pub fn bounds(route: &Route) -> Option<Bounds> {
    let first = route.points.first()?.coordinate;
    let mut sw = first;
    let mut ne = first;
    for p in &route.points[1..] {
        sw.latitude = sw.latitude.min(p.coordinate.latitude);
        sw.longitude = sw.longitude.min(p.coordinate.longitude);
        ne.latitude = ne.latitude.max(p.coordinate.latitude);
        ne.longitude = ne.longitude.max(p.coordinate.longitude);
    }
    Some(Bounds {
        south_west: sw,
        north_east: ne,
    })
}
