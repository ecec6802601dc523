mod builder;
pub mod render;
mod types;

pub use builder::RouteBuilder;
pub use types::{Route, RoutePoint, RouteStats};
