//! Newsdesk Kernel Library
//!
//! News query engine, HTTP routes and application wiring. The main entry
//! point for running the server is the `newsdesk` binary.

pub mod config;
pub mod error;
pub mod news;
pub mod routes;
pub mod state;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use state::{AppState, RequestLimits};
