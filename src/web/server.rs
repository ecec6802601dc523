use axum::{routing::get, routing::post, Router};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::session::SystemClock;
use crate::storage::{ActivityStore, FileStore};
use crate::tracker::{ChannelSource, IntervalMotionSource, Tracker};

use super::api::routes as route_handlers;
use super::api::samples as sample_handlers;
use super::api::session as session_handlers;
use super::api_doc::ApiDoc;
use super::auth::AppState;
use super::config::Config;
use super::ui::handlers as ui_handlers;

pub async fn run_server(config: Config) -> std::io::Result<()> {
    let bind_addr = config.web.bind.clone();
    let classifier = config.classifier().map_err(std::io::Error::other)?;
    let motion_interval = config
        .sensors
        .motion_interval()
        .map_err(std::io::Error::other)?;

    let store = Arc::new(ActivityStore::new(FileStore::new(
        config.storage.base_folder.clone(),
    )));

    let positions = ChannelSource::new(config.sensors.location_permission);
    let motion = IntervalMotionSource::new(motion_interval, config.sensors.motion_permission);
    let (positions_handle, motion_handle) = (positions.handle(), motion.handle());

    let mut tracker = Tracker::new(classifier, Arc::new(SystemClock), positions, motion)
        .with_store(store.clone());
    if tracker.request_permissions() {
        log::info!("Sensor permissions granted");
    }

    let state = AppState {
        config: Arc::new(config),
        store,
        tracker: Arc::new(Mutex::new(tracker)),
        positions: positions_handle,
        motion: motion_handle,
    };

    let app = router(state);

    log::info!("Starting server on {}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // UI routes
        .route("/", get(ui_handlers::dashboard))
        .route("/routes/{id}", get(ui_handlers::route))
        // Session API endpoints
        .route("/api/session/start", post(session_handlers::start))
        .route("/api/session/stop", post(session_handlers::stop))
        .route("/api/session/status", get(session_handlers::status))
        .route("/api/session/log", get(session_handlers::log))
        // Sample ingestion
        .route(
            "/api/samples/location",
            post(sample_handlers::push_location),
        )
        .route(
            "/api/samples/acceleration",
            post(sample_handlers::push_acceleration),
        )
        // Routes and stats
        .route("/api/routes", get(route_handlers::list_routes))
        .route("/api/routes/{id}", get(route_handlers::get_route))
        .route(
            "/api/routes/{id}/segments",
            get(route_handlers::route_segments),
        )
        .route("/api/stats/last", get(route_handlers::last_stats))
        .route("/api/stats/totals", get(route_handlers::total_stats))
        // OpenAPI / Swagger
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
