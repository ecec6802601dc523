mod aggregator;
mod clock;
mod error;
mod fusion;
mod sample;
mod stats;

pub use aggregator::SessionState;
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::SessionError;
pub use fusion::{FusionEngine, FusionStatus};
pub use sample::{AccelerationReading, AccelerationSample, ActivityLogEntry, LocationSample};
pub use stats::{FinishedSession, SessionStats};
