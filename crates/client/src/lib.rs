//! HTTP client for the Steeple API.
//!
//! [`SteepleApi`] implements the console store traits from `steeple-core`,
//! so the attendance session and schedule board run unchanged against a
//! live server.

pub mod api;
pub mod config;

pub use api::{ClientError, SteepleApi};
pub use config::ClientConfig;
