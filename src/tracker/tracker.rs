use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex as StdMutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use log::{error, info, warn};
use serde::Serialize;

use super::error::TrackerError;
use super::source::{SampleSource, Subscription};
use crate::classifier::MotionClassifier;
use crate::route::{Route, RouteBuilder};
use crate::session::{
    AccelerationReading, ActivityLogEntry, Clock, FinishedSession, FusionEngine, FusionStatus,
    LocationSample,
};
use crate::storage::{ActivityStore, StorageError, TotalStats};

const REFRESH_PERIOD: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub enum TrackerMode {
    Idle,
    Running { start: DateTime<Utc> },
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct TrackerStatus {
    pub mode: TrackerMode,
    pub has_permission: bool,
    pub pending_saves: usize,
    pub session: FusionStatus,
}

/// Everything `stop` produced. A failed save is reported here; the session
/// stays queued and is written on the next `stop` or `flush_pending`.
#[derive(Debug)]
pub struct StopOutcome {
    pub session: FinishedSession,
    pub route: Option<Route>,
    pub totals: Option<TotalStats>,
    pub save_error: Option<StorageError>,
}

struct Shared {
    mode: TrackerMode,
    engine: FusionEngine,
}

struct WorkerHandle {
    stop_tx: oneshot::Sender<()>,
    join: JoinHandle<()>,
}

struct PendingSave {
    session: FinishedSession,
    route: Option<Route>,
}

pub struct Tracker {
    clock: Arc<dyn Clock>,
    positions: Box<dyn SampleSource<LocationSample>>,
    motion: Box<dyn SampleSource<AccelerationReading>>,
    store: Option<Arc<ActivityStore>>,
    shared: Arc<StdMutex<Shared>>,
    worker: Option<WorkerHandle>,
    has_permission: bool,
    pending: Vec<PendingSave>,
}

impl Tracker {
    pub fn new(
        classifier: MotionClassifier,
        clock: Arc<dyn Clock>,
        positions: impl SampleSource<LocationSample> + 'static,
        motion: impl SampleSource<AccelerationReading> + 'static,
    ) -> Self {
        Self {
            shared: Arc::new(StdMutex::new(Shared {
                mode: TrackerMode::Idle,
                engine: FusionEngine::new(classifier, clock.clone()),
            })),
            clock,
            positions: Box::new(positions),
            motion: Box::new(motion),
            store: None,
            worker: None,
            has_permission: false,
            pending: Vec::new(),
        }
    }

    pub fn with_store(mut self, store: Arc<ActivityStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn request_permissions(&mut self) -> bool {
        let location = self.positions.request_permission();
        let motion = self.motion.request_permission();
        self.has_permission = location && motion;
        if !self.has_permission {
            warn!(
                "Sensor permissions not granted (location: {}, motion: {})",
                location, motion
            );
        }
        self.has_permission
    }

    pub fn has_permission(&self) -> bool {
        self.has_permission
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    pub fn status(&self) -> TrackerStatus {
        let locked = self.lock();
        TrackerStatus {
            mode: locked.mode.clone(),
            has_permission: self.has_permission,
            pending_saves: self.pending.len(),
            session: locked.engine.status(),
        }
    }

    pub fn log(&self) -> Vec<ActivityLogEntry> {
        self.lock().engine.log().to_vec()
    }

    /// Subscribes to both sources and starts the ingestion worker. Needs a
    /// tokio runtime.
    pub fn start(&mut self) -> Result<TrackerMode, TrackerError> {
        if self.worker.is_some() {
            return Err(TrackerError::AlreadyRunning);
        }
        if !self.has_permission {
            return Err(TrackerError::PermissionDenied);
        }

        let mode = TrackerMode::Running {
            start: DateTime::from_timestamp_millis(self.clock.now_ms()).unwrap_or_else(Utc::now),
        };
        {
            let mut locked = self.lock();
            locked.engine.start()?;
            locked.mode = mode.clone();
        }

        let positions = self.positions.subscribe();
        let motion = self.motion.subscribe();
        let (stop_tx, stop_rx) = oneshot::channel();
        let join = tokio::spawn(run_session_loop(
            self.shared.clone(),
            positions,
            motion,
            stop_rx,
        ));
        self.worker = Some(WorkerHandle { stop_tx, join });

        Ok(mode)
    }

    pub async fn stop(&mut self) -> Result<StopOutcome, TrackerError> {
        let worker = self.worker.take().ok_or(TrackerError::NotRunning)?;
        let _ = worker.stop_tx.send(());
        if let Err(e) = worker.join.await {
            error!("Session worker ended abnormally: {}", e);
        }

        let session = {
            let mut locked = self.lock();
            locked.mode = TrackerMode::Idle;
            locked.engine.stop()?
        };

        let route = RouteBuilder::build(&session.log, &session.stats);
        if route.is_none() {
            info!("Nothing to save: session produced no route points");
        }

        let mut totals = None;
        let mut save_error = None;
        if self.store.is_some() {
            self.pending.push(PendingSave {
                session: session.clone(),
                route: route.clone(),
            });
            match self.flush_pending() {
                Ok(t) => totals = t,
                Err(e) => {
                    error!(
                        "Failed to persist session ({} pending): {}",
                        self.pending.len(),
                        e
                    );
                    save_error = Some(e);
                }
            }
        }

        Ok(StopOutcome {
            session,
            route,
            totals,
            save_error,
        })
    }

    /// Writes sessions whose save failed earlier, oldest first.
    pub fn flush_pending(&mut self) -> Result<Option<TotalStats>, StorageError> {
        let Some(store) = self.store.clone() else {
            return Ok(None);
        };

        let mut totals = None;
        while let Some(pending) = self.pending.first() {
            totals = Some(store.save_session(&pending.session, pending.route.as_ref())?);
            if let Some(route) = &pending.route {
                info!("Saved route {} ({} points)", route.name, route.points.len());
            }
            self.pending.remove(0);
        }
        Ok(totals)
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        lock(&self.shared)
    }
}

fn lock(shared: &StdMutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn run_session_loop(
    shared: Arc<StdMutex<Shared>>,
    mut positions: Subscription<LocationSample>,
    mut motion: Subscription<AccelerationReading>,
    mut stop_rx: oneshot::Receiver<()>,
) {
    let mut refresh = tokio::time::interval(REFRESH_PERIOD);

    loop {
        tokio::select! {
            biased;
            _ = &mut stop_rx => break,
            Some(sample) = positions.recv() => on_location(&shared, sample),
            Some(reading) = motion.recv() => on_acceleration(&shared, reading),
            _ = refresh.tick() => lock(&shared).engine.refresh(),
        }
    }

    positions.unsubscribe();
    motion.unsubscribe();

    // Samples queued before the stop request still belong to the session.
    // Arrival order across the two queues is not recorded, so locations are
    // applied first and drained readings are stamped with the drain-time
    // clock. The gap is at most the time between the last worker wake-up and
    // the stop request.
    while let Some(sample) = positions.try_recv() {
        on_location(&shared, sample);
    }
    while let Some(reading) = motion.try_recv() {
        on_acceleration(&shared, reading);
    }
}

fn on_location(shared: &StdMutex<Shared>, sample: LocationSample) {
    if let Err(e) = lock(shared).engine.on_location(sample) {
        warn!("Dropping location sample: {}", e);
    }
}

fn on_acceleration(shared: &StdMutex<Shared>, reading: AccelerationReading) {
    if let Err(e) = lock(shared).engine.on_acceleration(reading) {
        warn!("Dropping acceleration reading: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::ActivityLabel;
    use crate::geodesy::Coordinate;
    use crate::session::ManualClock;
    use crate::storage::{KeyValueStore, MemoryStore};
    use crate::tracker::source::{ChannelSource, IntervalMotionSource, SourceHandle};
    use std::sync::atomic::{AtomicBool, Ordering};

    struct FlakyStore {
        failing: Arc<AtomicBool>,
        inner: MemoryStore,
    }

    impl KeyValueStore for FlakyStore {
        fn put(&self, key: &str, value: &str) -> Result<(), StorageError> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(StorageError::Unavailable("disk full".into()));
            }
            self.inner.put(key, value)
        }

        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.inner.get(key)
        }
    }

    struct Rig {
        clock: Arc<ManualClock>,
        tracker: Tracker,
        positions: SourceHandle<LocationSample>,
        motion: SourceHandle<AccelerationReading>,
    }

    fn rig(permitted: bool) -> Rig {
        let clock = Arc::new(ManualClock::new(1_760_860_800_000));
        let positions = ChannelSource::new(permitted);
        let motion = ChannelSource::new(true);
        let (p, m) = (positions.handle(), motion.handle());
        let mut tracker = Tracker::new(MotionClassifier::default(), clock.clone(), positions, motion);
        tracker.request_permissions();
        Rig {
            clock,
            tracker,
            positions: p,
            motion: m,
        }
    }

    fn fix(lat: f64, lon: f64, timestamp: i64) -> LocationSample {
        LocationSample {
            coordinate: Coordinate::new(lat, lon).unwrap(),
            accuracy: None,
            speed: None,
            timestamp,
        }
    }

    #[tokio::test]
    async fn start_is_refused_without_permission() {
        let mut rig = rig(false);
        assert!(!rig.tracker.has_permission());
        assert!(matches!(
            rig.tracker.start(),
            Err(TrackerError::PermissionDenied)
        ));
        assert!(!rig.tracker.is_running());
        assert!(matches!(rig.tracker.status().mode, TrackerMode::Idle));
    }

    #[tokio::test]
    async fn start_twice_is_refused() {
        let mut rig = rig(true);
        rig.tracker.start().unwrap();
        assert!(matches!(
            rig.tracker.start(),
            Err(TrackerError::AlreadyRunning)
        ));
        rig.tracker.stop().await.unwrap();
    }

    #[tokio::test]
    async fn session_end_to_end_is_persisted() {
        let mut rig = rig(true);
        let store = Arc::new(ActivityStore::new(MemoryStore::new()));
        rig.tracker = rig.tracker.with_store(store.clone());
        let t0 = rig.clock.now_ms();

        rig.tracker.start().unwrap();
        assert!(rig.positions.is_subscribed());

        assert!(rig.positions.push(fix(0.0, 0.0001, t0)));
        rig.clock.set(t0 + 50_000);
        assert!(rig.positions.push(fix(0.0, 0.0010, t0 + 50_000)));
        rig.clock.set(t0 + 51_000);
        assert!(rig.motion.push(AccelerationReading::new(0.0, 1.2, 0.0)));

        let outcome = rig.tracker.stop().await.unwrap();
        assert!(!rig.positions.is_subscribed());
        assert!(!rig.motion.is_subscribed());

        let stats = &outcome.session.stats;
        assert!((stats.total_distance - 100.0).abs() < 0.5);
        assert_eq!(stats.steps, 1);
        assert_eq!(stats.duration, 51.0);
        assert_eq!(outcome.session.log.len(), 1);
        assert_eq!(outcome.session.log[0].activity, ActivityLabel::Walking);
        assert!(outcome.save_error.is_none());

        let route = outcome.route.unwrap();
        assert_eq!(route.points.len(), 1);
        assert_eq!(store.get_routes().unwrap(), vec![route]);
        assert_eq!(outcome.totals.unwrap().total_sessions, 1);
        assert_eq!(store.get_logs().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn stop_when_idle_is_rejected_consistently() {
        let mut rig = rig(true);
        rig.tracker.start().unwrap();
        rig.clock.advance(4_000);
        let outcome = rig.tracker.stop().await.unwrap();
        assert!(outcome.route.is_none());
        assert_eq!(outcome.session.stats.duration, 4.0);

        for _ in 0..3 {
            rig.clock.advance(10_000);
            assert!(matches!(
                rig.tracker.stop().await,
                Err(TrackerError::NotRunning)
            ));
            assert_eq!(rig.tracker.status().session.stats, outcome.session.stats);
        }
    }

    #[tokio::test]
    async fn samples_after_stop_are_dropped() {
        let mut rig = rig(true);
        rig.tracker.start().unwrap();
        rig.tracker.stop().await.unwrap();
        assert!(!rig.positions.push(fix(1.0, 1.0, 0)));
        assert!(!rig.motion.push(AccelerationReading::new(1.0, 1.0, 1.0)));
        assert_eq!(rig.tracker.status().session.log_len, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn quiet_motion_client_adds_no_entries() {
        let clock = Arc::new(ManualClock::new(0));
        let positions = ChannelSource::new(true);
        let motion = IntervalMotionSource::new(Duration::from_secs(1), true);
        let (fixes, readings) = (positions.handle(), motion.handle());
        let mut tracker = Tracker::new(MotionClassifier::default(), clock.clone(), positions, motion);
        assert!(tracker.request_permissions());

        tracker.start().unwrap();
        fixes.push(fix(0.0, 0.0001, 0));
        fixes.push(fix(0.0, 0.0010, 50_000));
        clock.set(51_000);
        readings.push(AccelerationReading::new(0.0, 1.2, 0.0));
        tokio::time::sleep(Duration::from_millis(60_500)).await;
        let first = tracker.stop().await.unwrap();

        assert_eq!(first.session.log.len(), 1);
        assert_eq!(first.session.log[0].activity, ActivityLabel::Walking);
        assert_eq!(first.session.stats.steps, 1);
        assert!((first.session.stats.calories - 0.05).abs() < 1e-12);

        // a reading pushed between sessions must not show up in the next one
        readings.push(AccelerationReading::new(0.0, 1.2, 0.0));
        tracker.start().unwrap();
        tokio::time::sleep(Duration::from_millis(5_500)).await;
        let second = tracker.stop().await.unwrap();

        assert!(second.session.log.is_empty());
        assert_eq!(second.session.stats.steps, 0);
        assert_eq!(second.session.stats.calories, 0.0);
    }

    #[tokio::test]
    async fn failed_save_is_retried() {
        let failing = Arc::new(AtomicBool::new(true));
        let store = Arc::new(ActivityStore::new(FlakyStore {
            failing: failing.clone(),
            inner: MemoryStore::new(),
        }));
        let mut rig = rig(true);
        rig.tracker = rig.tracker.with_store(store.clone());

        rig.tracker.start().unwrap();
        rig.positions.push(fix(45.0, 7.0, rig.clock.now_ms()));
        rig.clock.advance(1_000);
        rig.motion.push(AccelerationReading::new(0.0, 0.0, 0.0));
        let outcome = rig.tracker.stop().await.unwrap();

        assert!(outcome.save_error.is_some());
        assert!(outcome.route.is_some());
        assert_eq!(rig.tracker.status().pending_saves, 1);
        assert_eq!(rig.tracker.status().session.stats, outcome.session.stats);

        failing.store(false, Ordering::SeqCst);
        let totals = rig.tracker.flush_pending().unwrap().unwrap();
        assert_eq!(totals.total_sessions, 1);
        assert_eq!(rig.tracker.status().pending_saves, 0);
        assert_eq!(store.get_routes().unwrap().len(), 1);
    }
}
