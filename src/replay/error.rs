use thiserror::Error;

use crate::session::SessionError;

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("{0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("start: {0}")]
    Start(String),
    #[error("step {0}: {1}")]
    Step(usize, String),
    #[error("session error: {0}")]
    Session(#[from] SessionError),
}
