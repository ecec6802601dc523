use thiserror::Error;

use crate::session::SessionError;

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("tracker already running")]
    AlreadyRunning,
    #[error("tracker not running")]
    NotRunning,
    #[error("location or motion permission not granted")]
    PermissionDenied,
    #[error("session error: {0}")]
    Session(#[from] SessionError),
}
