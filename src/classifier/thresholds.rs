use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::error::ClassifierError;

/// Speed breakpoints in m/s.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SpeedThresholds {
    pub walking: f64,
    pub running: f64,
    pub vehicle: f64,
}

impl Default for SpeedThresholds {
    fn default() -> Self {
        Self {
            walking: 1.0,
            running: 3.0,
            vehicle: 6.5,
        }
    }
}

/// Acceleration magnitude breakpoints in m/s².
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AccelerationThresholds {
    pub walking: f64,
    pub running: f64,
    pub vehicle: f64,
}

impl Default for AccelerationThresholds {
    fn default() -> Self {
        Self {
            walking: 0.5,
            running: 1.5,
            vehicle: 0.2,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ThresholdTable {
    #[serde(default)]
    pub speed: SpeedThresholds,
    #[serde(default)]
    pub acceleration: AccelerationThresholds,
}

impl ThresholdTable {
    pub fn validate(&self) -> Result<(), ClassifierError> {
        let values = [
            ("speed.walking", self.speed.walking),
            ("speed.running", self.speed.running),
            ("speed.vehicle", self.speed.vehicle),
            ("acceleration.walking", self.acceleration.walking),
            ("acceleration.running", self.acceleration.running),
            ("acceleration.vehicle", self.acceleration.vehicle),
        ];
        for (name, value) in values {
            if !value.is_finite() || value <= 0.0 {
                return Err(ClassifierError::NonPositive { name, value });
            }
        }

        if !(self.speed.walking < self.speed.running && self.speed.running < self.speed.vehicle) {
            return Err(ClassifierError::NotIncreasing);
        }

        Ok(())
    }
}
