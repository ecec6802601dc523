//! Offline playback of recorded sensor samples through the fusion engine.

mod error;
mod parser;
mod runner;

pub use error::ReplayError;
pub use parser::Recording;
pub use runner::Replayer;
