use std::sync::Arc;

use serde::Serialize;
use utoipa::ToSchema;

use super::clock::Clock;
use super::error::SessionError;
use super::sample::ActivityLogEntry;
use super::stats::{FinishedSession, SessionStats};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Active,
}

/// Running statistics for one session at a time.
///
/// Duration follows the injected wall clock, not the number of samples, so
/// irregular arrival does not skew it. After `stop` the frozen statistics stay
/// readable through `snapshot` until the next `start`.
pub struct SessionAggregator {
    clock: Arc<dyn Clock>,
    state: SessionState,
    stats: SessionStats,
    log: Vec<ActivityLogEntry>,
    next_id: u64,
}

impl SessionAggregator {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            state: SessionState::Idle,
            stats: SessionStats::default(),
            log: Vec::new(),
            next_id: 1,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }

    pub fn start(&mut self) -> Result<(), SessionError> {
        if self.is_active() {
            return Err(SessionError::AlreadyActive);
        }

        self.stats = SessionStats {
            start_time: self.clock.now_ms(),
            ..SessionStats::default()
        };
        self.log.clear();
        self.next_id = 1;
        self.state = SessionState::Active;
        log::info!("Session started at {}", self.stats.start_time);
        Ok(())
    }

    /// Hands out the id for the next log entry.
    pub fn next_entry_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn ingest(
        &mut self,
        entry: ActivityLogEntry,
        distance_delta: f64,
    ) -> Result<(), SessionError> {
        if !self.is_active() {
            return Err(SessionError::NotActive);
        }

        self.add_distance(distance_delta);

        let activity = entry.activity;
        if activity.is_on_foot() {
            self.stats.steps += 1;
        }
        self.stats.calories += activity.calories_per_tick();

        self.stats.log_ids.push(entry.id);
        self.log.push(entry);
        self.update_timing();
        Ok(())
    }

    /// Applies a distance delta from the location path, without a log entry.
    pub fn record_distance(&mut self, distance_delta: f64) -> Result<(), SessionError> {
        if !self.is_active() {
            return Err(SessionError::NotActive);
        }
        self.add_distance(distance_delta);
        self.update_timing();
        Ok(())
    }

    /// Advances duration and average speed to the current clock reading.
    pub fn refresh(&mut self) {
        if self.is_active() {
            self.update_timing();
        }
    }

    pub fn stop(&mut self) -> Result<FinishedSession, SessionError> {
        if !self.is_active() {
            return Err(SessionError::NotActive);
        }

        self.update_timing();
        self.stats.end_time = self.clock.now_ms();
        self.state = SessionState::Idle;

        log::info!(
            "Session stopped: {:.1} m in {:.0} s, {} entries",
            self.stats.total_distance,
            self.stats.duration,
            self.log.len()
        );

        Ok(FinishedSession {
            stats: self.stats.clone(),
            log: std::mem::take(&mut self.log),
        })
    }

    pub fn snapshot(&self) -> SessionStats {
        self.stats.clone()
    }

    pub fn log(&self) -> &[ActivityLogEntry] {
        &self.log
    }

    fn add_distance(&mut self, delta: f64) {
        if delta.is_finite() && delta > 0.0 {
            self.stats.total_distance += delta;
        } else if delta != 0.0 {
            log::debug!("Ignoring distance delta {}", delta);
        }
    }

    fn update_timing(&mut self) {
        let elapsed_ms = (self.clock.now_ms() - self.stats.start_time).max(0);
        let elapsed = elapsed_ms as f64 / 1000.0;
        // a clock stepping backwards must not shrink the session
        self.stats.duration = self.stats.duration.max(elapsed);
        self.stats.average_speed = if self.stats.duration > 0.0 {
            self.stats.total_distance / self.stats.duration
        } else {
            0.0
        };
    }
}
