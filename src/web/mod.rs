//! HTTP surface: session control, sample ingestion, saved routes and the
//! dashboard.

pub mod api;
pub mod api_doc;
pub mod auth;
pub mod config;
pub mod server;
pub mod ui;

pub use auth::AppState;
pub use config::Config;
pub use server::{router, run_server};
