use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

use crate::geodesy::Coordinate;
use crate::session::{AccelerationReading, LocationSample};

use super::error::ReplayError;

#[derive(Debug, Clone)]
pub struct Recording {
    pub start: DateTime<Utc>,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone)]
pub struct Step {
    /// `None` replays the step at the time of the one before it.
    pub time: Option<TimeExpr>,
    pub sample: Sample,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TimeExpr {
    Relative(Duration),
    Absolute(DateTime<Utc>),
}

impl TimeExpr {
    /// `None` when the offset lands outside the representable date range.
    pub fn resolve(&self, start: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            TimeExpr::Relative(d) => start.checked_add_signed(*d),
            TimeExpr::Absolute(dt) => Some(*dt),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Sample {
    Location(LocationFix),
    Acceleration(AccelerationReading),
}

/// A position fix as written in a recording. The timestamp comes from the
/// step time.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LocationFix {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub accuracy: Option<f64>,
    #[serde(default)]
    pub speed: Option<f64>,
}

impl LocationFix {
    pub fn at(self, timestamp: i64) -> LocationSample {
        LocationSample {
            coordinate: Coordinate {
                latitude: self.latitude,
                longitude: self.longitude,
            },
            accuracy: self.accuracy,
            speed: self.speed,
            timestamp,
        }
    }
}

impl Recording {
    pub fn from_str(yaml: &str) -> Result<Self, ReplayError> {
        let root: serde_yaml::Value = serde_yaml::from_str(yaml)?;

        let start = match root.get("start") {
            None => DateTime::UNIX_EPOCH,
            Some(v) => {
                let s = v
                    .as_str()
                    .ok_or_else(|| ReplayError::Start("expected a timestamp".into()))?;
                DateTime::parse_from_rfc3339(s.trim())
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(|e| ReplayError::Start(e.to_string()))?
            }
        };

        let steps = root
            .get("steps")
            .and_then(|v| v.as_sequence())
            .ok_or_else(|| ReplayError::Step(0, "missing 'steps'".into()))?
            .iter()
            .enumerate()
            .map(|(i, v)| parse_step(i, v))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Recording { start, steps })
    }
}

fn parse_step(i: usize, value: &serde_yaml::Value) -> Result<Step, ReplayError> {
    let err = |msg: &str| ReplayError::Step(i, msg.into());
    let map = value.as_mapping().ok_or_else(|| err("expected mapping"))?;

    let time = match map.get("time") {
        None => None,
        Some(v) => {
            let s = v.as_str().ok_or_else(|| err("time must be a string"))?;
            Some(parse_time(s).map_err(|e| err(&e))?)
        }
    };

    let (kind, value) = map
        .iter()
        .find(|(k, _)| k.as_str() != Some("time"))
        .ok_or_else(|| err("no sample found"))?;
    if map.len() > 2 || (time.is_none() && map.len() > 1) {
        return Err(err("expected exactly one sample per step"));
    }

    let kind = kind.as_str().ok_or_else(|| err("sample kind must be string"))?;
    let sample = match kind {
        "location" => Sample::Location(
            serde_yaml::from_value(value.clone()).map_err(|e| err(&e.to_string()))?,
        ),
        "acceleration" => Sample::Acceleration(
            serde_yaml::from_value(value.clone()).map_err(|e| err(&e.to_string()))?,
        ),
        _ => return Err(err(&format!("unknown sample kind: {}", kind))),
    };

    Ok(Step { time, sample })
}

fn parse_time(s: &str) -> Result<TimeExpr, String> {
    let s = s.trim();

    // Relative: T+10s
    if let Some(rest) = s.strip_prefix(['T', 't']) {
        if rest.starts_with('-') {
            return Err("relative times cannot precede the start".into());
        }
        let rest = rest.strip_prefix('+').unwrap_or(rest);
        return parse_duration(rest).map(TimeExpr::Relative);
    }

    DateTime::parse_from_rfc3339(s)
        .map(|dt| TimeExpr::Absolute(dt.with_timezone(&Utc)))
        .map_err(|e| e.to_string())
}

fn parse_duration(s: &str) -> Result<Duration, String> {
    humantime::parse_duration(s.trim())
        .map_err(|e| e.to_string())
        .and_then(|d| Duration::from_std(d).map_err(|e| e.to_string()))
}
