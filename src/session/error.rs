use thiserror::Error;

use crate::geodesy::GeodesyError;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    #[error("session already active")]
    AlreadyActive,
    #[error("no active session")]
    NotActive,
    #[error("invalid location: {0}")]
    InvalidLocation(#[from] GeodesyError),
}
