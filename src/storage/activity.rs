use log::warn;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::route::Route;
use crate::session::{ActivityLogEntry, FinishedSession, SessionStats};

use super::error::StorageError;
use super::kv::KeyValueStore;

const LOGS_KEY: &str = "activity_logs";
const LAST_STATS_KEY: &str = "last_session_stats";
const TOTAL_STATS_KEY: &str = "total_stats";
const ROUTES_KEY: &str = "saved_routes";

/// Running totals across every stopped session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct TotalStats {
    pub total_sessions: u64,
    pub total_distance: f64,
    pub total_duration: f64,
    pub total_calories: f64,
    pub total_steps: u64,
}

impl TotalStats {
    fn add(&self, stats: &SessionStats) -> Self {
        let finite = |v: f64| if v.is_finite() { v } else { 0.0 };
        Self {
            total_sessions: self.total_sessions + 1,
            total_distance: self.total_distance + finite(stats.total_distance),
            total_duration: self.total_duration + finite(stats.duration),
            total_calories: self.total_calories + finite(stats.calories),
            total_steps: self.total_steps + stats.steps,
        }
    }
}

/// Typed view over the key-value store.
pub struct ActivityStore {
    kv: Box<dyn KeyValueStore>,
}

impl ActivityStore {
    pub fn new(kv: impl KeyValueStore + 'static) -> Self {
        Self { kv: Box::new(kv) }
    }

    pub fn save_logs(&self, logs: &[ActivityLogEntry]) -> Result<(), StorageError> {
        self.write(LOGS_KEY, logs)
    }

    pub fn get_logs(&self) -> Result<Vec<ActivityLogEntry>, StorageError> {
        Ok(self.read(LOGS_KEY)?.unwrap_or_default())
    }

    /// Stores the stats as the last session and adds them to the totals.
    pub fn save_stats(&self, stats: &SessionStats) -> Result<TotalStats, StorageError> {
        self.write(LAST_STATS_KEY, stats)?;
        let totals = self.get_total_stats()?.add(stats);
        self.write(TOTAL_STATS_KEY, &totals)?;
        Ok(totals)
    }

    pub fn get_last_stats(&self) -> Result<Option<SessionStats>, StorageError> {
        self.read(LAST_STATS_KEY)
    }

    pub fn get_total_stats(&self) -> Result<TotalStats, StorageError> {
        Ok(self.read(TOTAL_STATS_KEY)?.unwrap_or_default())
    }

    pub fn get_routes(&self) -> Result<Vec<Route>, StorageError> {
        Ok(self.read(ROUTES_KEY)?.unwrap_or_default())
    }

    pub fn get_route(&self, id: &str) -> Result<Route, StorageError> {
        self.get_routes()?
            .into_iter()
            .find(|r| r.id == id)
            .ok_or_else(|| StorageError::NotFound(id.to_string()))
    }

    /// Saving a route with an id that is already stored replaces it.
    pub fn save_route(&self, route: &Route) -> Result<(), StorageError> {
        let mut routes = self.get_routes()?;
        routes.retain(|r| r.id != route.id);
        routes.push(route.clone());
        routes.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        self.write(ROUTES_KEY, &routes)
    }

    /// Persists everything a stopped session produces. The totals are
    /// written last, so a failure earlier can be retried without counting
    /// the session twice.
    pub fn save_session(
        &self,
        session: &FinishedSession,
        route: Option<&Route>,
    ) -> Result<TotalStats, StorageError> {
        self.save_logs(&session.log)?;
        if let Some(route) = route {
            self.save_route(route)?;
        }
        self.save_stats(&session.stats)
    }

    fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        let Some(raw) = self.kv.get(key)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            // The next save replaces the payload, so a copy is kept aside.
            Err(e) => {
                let backup = format!("{}_corrupt", key);
                warn!("Discarding unreadable {} ({}), copy kept as {}", key, e, backup);
                if self.kv.get(&backup)?.as_deref() != Some(raw.as_str()) {
                    self.kv.put(&backup, &raw)?;
                }
                Ok(None)
            }
        }
    }

    fn write<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let raw = serde_json::to_string(value)?;
        self.kv.put(key, &raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::{RoutePoint, RouteStats};
    use crate::geodesy::Coordinate;
    use crate::storage::{FileStore, MemoryStore};

    fn stats(distance: f64, steps: u64) -> SessionStats {
        SessionStats {
            start_time: 1_000,
            end_time: 61_000,
            duration: 60.0,
            total_distance: distance,
            steps,
            calories: 1.5,
            average_speed: distance / 60.0,
            log_ids: vec![],
        }
    }

    fn route(id: &str, created_at: i64) -> Route {
        Route {
            id: id.to_string(),
            name: format!("Route {}", id),
            created_at,
            stats: RouteStats::from(&stats(10.0, 1)),
            points: vec![RoutePoint {
                coordinate: Coordinate {
                    latitude: 1.0,
                    longitude: 2.0,
                },
                speed: 1.0,
                timestamp: created_at,
            }],
        }
    }

    #[test]
    fn empty_store_defaults() {
        let store = ActivityStore::new(MemoryStore::new());
        assert!(store.get_logs().unwrap().is_empty());
        assert!(store.get_routes().unwrap().is_empty());
        assert_eq!(store.get_last_stats().unwrap(), None);
        assert_eq!(store.get_total_stats().unwrap(), TotalStats::default());
    }

    #[test]
    fn totals_accumulate_on_every_save() {
        let store = ActivityStore::new(MemoryStore::new());
        store.save_stats(&stats(100.0, 10)).unwrap();
        let totals = store.save_stats(&stats(50.0, 5)).unwrap();
        assert_eq!(totals.total_sessions, 2);
        assert_eq!(totals.total_distance, 150.0);
        assert_eq!(totals.total_duration, 120.0);
        assert_eq!(totals.total_calories, 3.0);
        assert_eq!(totals.total_steps, 15);
        assert_eq!(store.get_total_stats().unwrap(), totals);
        assert_eq!(store.get_last_stats().unwrap().unwrap().total_distance, 50.0);
    }

    #[test]
    fn routes_are_kept_in_creation_order_and_replaced_by_id() {
        let store = ActivityStore::new(MemoryStore::new());
        store.save_route(&route("b", 20)).unwrap();
        store.save_route(&route("a", 10)).unwrap();
        let mut updated = route("b", 20);
        updated.name = "renamed".into();
        store.save_route(&updated).unwrap();

        let routes = store.get_routes().unwrap();
        let ids: Vec<&str> = routes.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(store.get_route("b").unwrap().name, "renamed");
        assert!(matches!(
            store.get_route("missing"),
            Err(StorageError::NotFound(_))
        ));
    }

    #[test]
    fn corrupt_payload_reads_as_empty() {
        let kv = MemoryStore::new();
        kv.put(ROUTES_KEY, "not json").unwrap();
        let store = ActivityStore::new(kv);
        assert!(store.get_routes().unwrap().is_empty());
    }

    #[test]
    fn corrupt_payload_survives_the_next_save() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("saved_routes.json"), "not json").unwrap();
        let store = ActivityStore::new(FileStore::new(dir.path().to_path_buf()));

        assert!(store.get_routes().unwrap().is_empty());
        store.save_route(&route("r1", 1)).unwrap();

        let kept = std::fs::read_to_string(dir.path().join("saved_routes_corrupt.json")).unwrap();
        assert_eq!(kept, "not json");
        assert_eq!(store.get_routes().unwrap().len(), 1);
    }

    #[test]
    fn persisted_json_uses_camel_case() {
        let dir = tempfile::tempdir().unwrap();
        let store = ActivityStore::new(FileStore::new(dir.path().to_path_buf()));
        store.save_stats(&stats(10.0, 1)).unwrap();
        let raw = std::fs::read_to_string(dir.path().join("total_stats.json")).unwrap();
        assert!(raw.contains("\"totalSessions\":1"));
        let raw = std::fs::read_to_string(dir.path().join("last_session_stats.json")).unwrap();
        assert!(raw.contains("\"totalDistance\":10.0"));
    }

    #[test]
    fn save_session_writes_everything() {
        let dir = tempfile::tempdir().unwrap();
        let store = ActivityStore::new(FileStore::new(dir.path().to_path_buf()));
        let session = FinishedSession {
            stats: stats(42.0, 4),
            log: vec![],
        };
        let totals = store.save_session(&session, Some(&route("r1", 1))).unwrap();
        assert_eq!(totals.total_sessions, 1);
        assert_eq!(store.get_routes().unwrap().len(), 1);

        let reopened = ActivityStore::new(FileStore::new(dir.path().to_path_buf()));
        assert_eq!(reopened.get_total_stats().unwrap().total_distance, 42.0);
        assert_eq!(reopened.get_route("r1").unwrap().points.len(), 1);
    }
}
