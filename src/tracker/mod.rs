mod error;
mod source;
mod tracker;

pub use error::TrackerError;
pub use source::{ChannelSource, IntervalMotionSource, MotionHandle, SourceHandle};
pub use tracker::{Tracker, TrackerMode, TrackerStatus};
