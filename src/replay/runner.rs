use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{debug, warn};

use crate::classifier::MotionClassifier;
use crate::route::{Route, RouteBuilder};
use crate::session::{FinishedSession, FusionEngine, ManualClock};

use super::error::ReplayError;
use super::parser::{Recording, Sample};

#[derive(Debug)]
pub struct ReplayOutcome {
    pub session: FinishedSession,
    pub route: Option<Route>,
}

/// Feeds a recording through a fresh session on a manual clock, so the
/// result depends only on the recording and the threshold table.
pub struct Replayer {
    classifier: MotionClassifier,
}

impl Replayer {
    pub fn new(classifier: MotionClassifier) -> Self {
        Self { classifier }
    }

    pub fn run(&self, recording: &Recording) -> Result<ReplayOutcome, ReplayError> {
        let clock = Arc::new(ManualClock::new(recording.start.timestamp_millis()));
        let mut engine = FusionEngine::new(self.classifier.clone(), clock.clone());
        engine.start()?;

        let mut now: DateTime<Utc> = recording.start;
        for (i, step) in recording.steps.iter().enumerate() {
            if let Some(time) = &step.time {
                let at = time.resolve(recording.start).ok_or_else(|| {
                    ReplayError::Step(i, "time is outside the supported date range".into())
                })?;
                if at < now {
                    return Err(ReplayError::Step(
                        i,
                        format!("time {} is before the previous step", at),
                    ));
                }
                now = at;
            }
            let ts = now.timestamp_millis();
            clock.set(ts);

            match step.sample {
                Sample::Location(fix) => {
                    if let Err(e) = engine.on_location(fix.at(ts)) {
                        warn!("Step {}: skipping location: {}", i, e);
                    }
                }
                Sample::Acceleration(reading) => {
                    let entry = engine.on_acceleration(reading)?;
                    debug!("Step {}: {} ({})", i, entry.activity, entry.confidence);
                }
            }
            engine.refresh();
        }

        let session = engine.stop()?;
        let route = RouteBuilder::build(&session.log, &session.stats);
        Ok(ReplayOutcome { session, route })
    }
}
