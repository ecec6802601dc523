use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::classifier::ActivityLabel;
use crate::geodesy::Coordinate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LocationSample {
    pub coordinate: Coordinate,
    /// Metres, when the source reports it.
    #[serde(default)]
    pub accuracy: Option<f64>,
    /// Speed as reported by the source. The fusion engine derives its own.
    #[serde(default)]
    pub speed: Option<f64>,
    pub timestamp: i64,
}

/// Raw reading as delivered by a motion source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AccelerationReading {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl AccelerationReading {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    pub fn at(self, timestamp: i64) -> AccelerationSample {
        AccelerationSample {
            x: self.x,
            y: self.y,
            z: self.z,
            magnitude: self.magnitude(),
            timestamp,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AccelerationSample {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub magnitude: f64,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActivityLogEntry {
    pub id: u64,
    pub timestamp: i64,
    /// Latest known fix at classification time, possibly several ticks old.
    pub location: Option<LocationSample>,
    pub acceleration: AccelerationSample,
    pub activity: ActivityLabel,
    pub confidence: f64,
    pub speed: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn magnitude_of_reading() {
        let sample = AccelerationReading::new(3.0, 4.0, 12.0).at(42);
        assert_eq!(sample.magnitude, 13.0);
        assert_eq!(sample.timestamp, 42);
    }

    #[test]
    fn location_sample_json_shape() {
        let json = r#"{"coordinate":{"latitude":1.5,"longitude":2.5},"timestamp":7}"#;
        let sample: LocationSample = serde_json::from_str(json).unwrap();
        assert_eq!(sample.accuracy, None);
        assert_eq!(sample.speed, None);
        assert_eq!(sample.coordinate.longitude, 2.5);
    }
}
