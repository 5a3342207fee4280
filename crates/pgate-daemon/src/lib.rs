//! Policy gate daemon.
//!
//! Wires the pieces together:
//! - Layered configuration (TOML file, then `PGATE__` environment overrides)
//! - One shared `PolicyGate`
//! - The HTTP adapter, served until Ctrl-C

pub mod app;
pub mod config;
pub mod error;

pub use app::Application;
pub use config::AppConfig;
pub use error::{AppError, AppResult};
