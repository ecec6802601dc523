use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClassifierError {
    #[error("{name} threshold must be positive and finite, got {value}")]
    NonPositive { name: &'static str, value: f64 },
    #[error("speed thresholds must be strictly increasing (walking < running < vehicle)")]
    NotIncreasing,
}
