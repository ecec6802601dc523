use serde::{Deserialize, Serialize};
use strum_macros::{Display, IntoStaticStr};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, IntoStaticStr, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ActivityLabel {
    Idle,
    Walking,
    Running,
    Vehicle,
    Unknown,
}

impl ActivityLabel {
    /// Activities that count towards the step estimate.
    pub fn is_on_foot(&self) -> bool {
        matches!(self, ActivityLabel::Walking | ActivityLabel::Running)
    }

    /// Calories credited per classified tick.
    pub fn calories_per_tick(&self) -> f64 {
        match self {
            ActivityLabel::Running => 0.1,
            ActivityLabel::Walking => 0.05,
            _ => 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Classification {
    pub activity: ActivityLabel,
    pub confidence: f64,
}

impl Classification {
    pub fn new(activity: ActivityLabel, confidence: f64) -> Self {
        Self {
            activity,
            confidence,
        }
    }
}

impl Default for Classification {
    fn default() -> Self {
        Self::new(ActivityLabel::Unknown, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_text() {
        assert_eq!(ActivityLabel::Vehicle.to_string(), "vehicle");
        let s: &'static str = ActivityLabel::Walking.into();
        assert_eq!(s, "walking");
        assert_eq!(
            serde_json::to_string(&ActivityLabel::Unknown).unwrap(),
            "\"unknown\""
        );
    }
}
