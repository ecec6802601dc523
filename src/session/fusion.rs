use std::sync::Arc;

use serde::Serialize;
use utoipa::ToSchema;

use crate::classifier::{Classification, MotionClassifier};
use crate::geodesy;

use super::aggregator::{SessionAggregator, SessionState};
use super::clock::Clock;
use super::error::SessionError;
use super::sample::{AccelerationReading, AccelerationSample, ActivityLogEntry, LocationSample};
use super::stats::{FinishedSession, SessionStats};

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FusionStatus {
    pub state: SessionState,
    pub stats: SessionStats,
    pub current: Classification,
    pub speed: Option<f64>,
    pub last_location: Option<LocationSample>,
    pub last_acceleration: Option<AccelerationSample>,
    pub log_len: usize,
}

/// Merge point for the position and motion streams.
///
/// Location updates only move the last known fix, derive a speed from the
/// previous fix and feed the distance delta to the aggregator. Every
/// acceleration tick is classified against whatever speed was derived last,
/// however old that fix is.
pub struct FusionEngine {
    clock: Arc<dyn Clock>,
    classifier: MotionClassifier,
    aggregator: SessionAggregator,
    last_location: Option<LocationSample>,
    speed: Option<f64>,
    last_acceleration: Option<AccelerationSample>,
    current: Classification,
}

impl FusionEngine {
    pub fn new(classifier: MotionClassifier, clock: Arc<dyn Clock>) -> Self {
        Self {
            aggregator: SessionAggregator::new(clock.clone()),
            clock,
            classifier,
            last_location: None,
            speed: None,
            last_acceleration: None,
            current: Classification::default(),
        }
    }

    pub fn start(&mut self) -> Result<(), SessionError> {
        self.aggregator.start()?;
        self.last_location = None;
        self.speed = None;
        self.last_acceleration = None;
        self.current = Classification::default();
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.aggregator.is_active()
    }

    /// Returns the distance travelled since the previous fix.
    pub fn on_location(&mut self, sample: LocationSample) -> Result<f64, SessionError> {
        if !self.is_active() {
            return Err(SessionError::NotActive);
        }
        sample.coordinate.validate()?;

        let mut delta = 0.0;
        if let Some(previous) = &self.last_location {
            delta = geodesy::distance(&previous.coordinate, &sample.coordinate);
            let dt = (sample.timestamp - previous.timestamp) as f64 / 1000.0;
            if dt > 0.0 {
                self.speed = Some(delta / dt);
            }
            self.aggregator.record_distance(delta)?;
        }

        log::trace!(
            "Location {:.6},{:.6} delta={:.2} m speed={:?}",
            sample.coordinate.latitude,
            sample.coordinate.longitude,
            delta,
            self.speed
        );
        self.last_location = Some(sample);
        Ok(delta)
    }

    pub fn on_acceleration(
        &mut self,
        reading: AccelerationReading,
    ) -> Result<ActivityLogEntry, SessionError> {
        if !self.is_active() {
            return Err(SessionError::NotActive);
        }

        let acceleration = reading.at(self.clock.now_ms());
        let classification = self.classifier.classify(self.speed, acceleration.magnitude);

        let entry = ActivityLogEntry {
            id: self.aggregator.next_entry_id(),
            timestamp: acceleration.timestamp,
            location: self.last_location.clone(),
            acceleration,
            activity: classification.activity,
            confidence: classification.confidence,
            speed: self.speed,
        };
        self.aggregator.ingest(entry.clone(), 0.0)?;

        log::debug!(
            "Classified {} ({:.1}) at speed {:?}, |a|={:.2}",
            classification.activity,
            classification.confidence,
            self.speed,
            acceleration.magnitude
        );
        self.last_acceleration = Some(acceleration);
        self.current = classification;
        Ok(entry)
    }

    pub fn refresh(&mut self) {
        self.aggregator.refresh();
    }

    pub fn stop(&mut self) -> Result<FinishedSession, SessionError> {
        self.aggregator.stop()
    }

    pub fn log(&self) -> &[ActivityLogEntry] {
        self.aggregator.log()
    }

    pub fn status(&self) -> FusionStatus {
        FusionStatus {
            state: self.aggregator.state(),
            stats: self.aggregator.snapshot(),
            current: self.current,
            speed: self.speed,
            last_location: self.last_location.clone(),
            last_acceleration: self.last_acceleration,
            log_len: self.aggregator.log().len(),
        }
    }
}
