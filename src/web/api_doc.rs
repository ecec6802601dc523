use utoipa::{
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
    Modify, OpenApi,
};

use super::api::{error, routes, samples, session};

#[derive(OpenApi)]
#[openapi(
    paths(
        session::start,
        session::stop,
        session::status,
        session::log,
        samples::push_location,
        samples::push_acceleration,
        routes::list_routes,
        routes::get_route,
        routes::route_segments,
        routes::last_stats,
        routes::total_stats,
    ),
    components(
        schemas(
            error::ErrorResponse,
            session::StopResponse,
            samples::LocationRequest,
            samples::SampleAccepted,
            routes::RouteSummary,
            routes::RouteSegmentsResponse,
            crate::tracker::TrackerMode,
            crate::tracker::TrackerStatus,
            crate::session::FusionStatus,
            crate::session::SessionState,
            crate::session::SessionStats,
            crate::session::ActivityLogEntry,
            crate::session::LocationSample,
            crate::session::AccelerationReading,
            crate::session::AccelerationSample,
            crate::classifier::ActivityLabel,
            crate::classifier::Classification,
            crate::geodesy::Coordinate,
            crate::route::Route,
            crate::route::RoutePoint,
            crate::route::RouteStats,
            crate::route::render::RouteSegment,
            crate::route::render::Bounds,
            crate::storage::TotalStats,
        )
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Stride-O-Mat API",
        description = "Activity tracking sessions, sensor samples and saved routes",
        version = "0.1.0"
    ),
    tags(
        (name = "session", description = "Session control and live status"),
        (name = "samples", description = "Sensor sample ingestion"),
        (name = "routes", description = "Saved routes"),
        (name = "stats", description = "Session statistics")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "api_key",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_every_endpoint() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/session/start",
            "/api/session/stop",
            "/api/session/status",
            "/api/session/log",
            "/api/samples/location",
            "/api/samples/acceleration",
            "/api/routes",
            "/api/routes/{id}",
            "/api/routes/{id}/segments",
            "/api/stats/last",
            "/api/stats/totals",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
    }
}
