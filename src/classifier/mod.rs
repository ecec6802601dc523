mod error;
mod thresholds;
mod types;

pub use error::ClassifierError;
pub use thresholds::{AccelerationThresholds, SpeedThresholds, ThresholdTable};
pub use types::{ActivityLabel, Classification};

/// Fixed decision table over (speed, acceleration magnitude).
///
/// Confidence values are constants attached to each branch, not a distance
/// to the nearest threshold.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MotionClassifier {
    table: ThresholdTable,
}

impl MotionClassifier {
    pub fn new(table: ThresholdTable) -> Result<Self, ClassifierError> {
        table.validate()?;
        Ok(Self { table })
    }

    pub fn table(&self) -> &ThresholdTable {
        &self.table
    }

    pub fn classify(&self, speed: Option<f64>, accel_magnitude: f64) -> Classification {
        let speed = match speed {
            Some(s) if s >= 0.0 => s,
            // None, negative and NaN all end up here
            _ => return Classification::new(ActivityLabel::Unknown, 0.0),
        };

        let s = &self.table.speed;
        let a = &self.table.acceleration;

        let (activity, confidence) = if speed < s.walking {
            (ActivityLabel::Idle, 0.8)
        } else if speed < s.running {
            if accel_magnitude > a.walking {
                (ActivityLabel::Walking, 0.7)
            } else {
                (ActivityLabel::Idle, 0.5)
            }
        } else if speed < s.vehicle {
            if accel_magnitude > a.running {
                (ActivityLabel::Running, 0.8)
            } else {
                (ActivityLabel::Walking, 0.6)
            }
        } else if accel_magnitude < a.vehicle {
            (ActivityLabel::Vehicle, 0.9)
        } else {
            (ActivityLabel::Running, 0.7)
        };

        Classification::new(activity, confidence)
    }
}
