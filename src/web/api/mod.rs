pub mod error;
pub mod routes;
pub mod samples;
pub mod session;

#[cfg(test)]
mod tests {
    use axum::extract::{Path, State};
    use axum::Json;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::Mutex;

    use super::error::ApiError;
    use super::samples::LocationRequest;
    use super::{routes, samples, session};
    use crate::classifier::MotionClassifier;
    use crate::session::{AccelerationReading, SystemClock};
    use crate::storage::{ActivityStore, MemoryStore};
    use crate::tracker::{ChannelSource, IntervalMotionSource, Tracker, TrackerMode};
    use crate::web::auth::{AppState, AuthenticatedUser};
    use crate::web::config::{Config, Permission};

    fn state() -> AppState {
        let config = Config::from_str("storage: { base_folder: ./unused }").unwrap();
        let store = Arc::new(ActivityStore::new(MemoryStore::new()));
        let positions = ChannelSource::new(true);
        let motion = IntervalMotionSource::new(Duration::from_secs(1), true);
        let (positions_handle, motion_handle) = (positions.handle(), motion.handle());
        let mut tracker = Tracker::new(
            MotionClassifier::default(),
            Arc::new(SystemClock),
            positions,
            motion,
        )
        .with_store(store.clone());
        tracker.request_permissions();

        AppState {
            config: Arc::new(config),
            store,
            tracker: Arc::new(Mutex::new(tracker)),
            positions: positions_handle,
            motion: motion_handle,
        }
    }

    fn user(permissions: &[Permission]) -> AuthenticatedUser {
        AuthenticatedUser {
            name: "test".into(),
            permissions: permissions.iter().copied().collect(),
        }
    }

    fn admin() -> AuthenticatedUser {
        user(&[
            Permission::PushSamples,
            Permission::ControlSession,
            Permission::ReadRoutes,
        ])
    }

    fn fix(latitude: f64, longitude: f64, timestamp: i64) -> Json<LocationRequest> {
        Json(LocationRequest {
            latitude,
            longitude,
            accuracy: None,
            speed: None,
            timestamp: Some(timestamp),
        })
    }

    #[tokio::test]
    async fn samples_need_an_active_session() {
        let state = state();
        assert!(matches!(
            samples::push_location(State(state.clone()), admin(), fix(1.0, 1.0, 0)).await,
            Err(ApiError::Conflict("session_not_active"))
        ));
        assert!(matches!(
            samples::push_acceleration(
                State(state.clone()),
                admin(),
                Json(AccelerationReading::new(0.0, 0.0, 1.0))
            )
            .await,
            Err(ApiError::Conflict("session_not_active"))
        ));
        assert!(matches!(
            session::stop(State(state), admin()).await,
            Err(ApiError::Conflict("session_not_active"))
        ));
    }

    #[tokio::test]
    async fn permissions_are_enforced() {
        let state = state();
        let phone = user(&[Permission::PushSamples]);
        assert!(matches!(
            session::start(State(state.clone()), phone.clone()).await,
            Err(ApiError::Permission(_))
        ));
        assert!(matches!(
            routes::list_routes(State(state), phone).await,
            Err(ApiError::Permission(_))
        ));
    }

    #[tokio::test]
    async fn out_of_range_location_is_a_validation_error() {
        let state = state();
        session::start(State(state.clone()), admin()).await.unwrap();
        assert!(matches!(
            samples::push_location(State(state.clone()), admin(), fix(100.0, 1.0, 0)).await,
            Err(ApiError::Validation(_))
        ));
        session::stop(State(state), admin()).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn session_round_trip() {
        let state = state();
        let Json(mode) = session::start(State(state.clone()), admin()).await.unwrap();
        assert!(matches!(mode, TrackerMode::Running { .. }));
        assert!(matches!(
            session::start(State(state.clone()), admin()).await,
            Err(ApiError::Conflict("session_active"))
        ));

        samples::push_location(State(state.clone()), admin(), fix(0.0, 0.0001, 0))
            .await
            .unwrap();
        samples::push_location(State(state.clone()), admin(), fix(0.0, 0.0010, 50_000))
            .await
            .unwrap();
        samples::push_acceleration(
            State(state.clone()),
            admin(),
            Json(AccelerationReading::new(0.0, 1.2, 0.0)),
        )
        .await
        .unwrap();
        tokio::time::sleep(Duration::from_millis(1_500)).await;

        let Json(stopped) = session::stop(State(state.clone()), admin()).await.unwrap();
        assert!((stopped.stats.total_distance - 100.0).abs() < 0.5);
        assert!(stopped.save_error.is_none());
        assert_eq!(stopped.totals.unwrap().total_sessions, 1);

        let Json(totals) = routes::total_stats(State(state.clone()), admin()).await.unwrap();
        assert_eq!(totals.total_sessions, 1);
        let Json(last) = routes::last_stats(State(state.clone()), admin()).await.unwrap();
        assert_eq!(last.unwrap().total_distance, stopped.stats.total_distance);

        let Json(listed) = routes::list_routes(State(state.clone()), admin()).await.unwrap();
        assert_eq!(listed.len(), 1);
        let id = stopped.route_id.expect("a walking entry yields a route");
        let Json(route) = routes::get_route(State(state.clone()), admin(), Path(id.clone()))
            .await
            .unwrap();
        assert_eq!(route.id, id);
        assert_eq!(listed[0].id, id);

        assert!(matches!(
            routes::route_segments(State(state), admin(), Path("missing".into())).await,
            Err(ApiError::NotFound("route_not_found"))
        ));
    }
}
