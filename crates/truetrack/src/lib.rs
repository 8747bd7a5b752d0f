//! TrueTrack - core library
//!
//! Shared state and wiring for the `truetrack` binary: settings, the demo
//! login, the fixture repository behind the dashboards, and scan context
//! construction.

pub mod config;
pub mod login;
pub mod repository;
pub mod scanning;

pub use config::{ConfigError, Settings};
pub use login::{login, Credentials, LoginError, Role};
pub use repository::{Repository, RepositoryError};
pub use scanning::{build_context, simulated_camera, simulated_decoder};
