//! Application wiring
//!
//! Loads the layered configuration and turns it into the engine's ports.

mod config;
mod loader;

pub use config::{AppConfig, SessionEntry};
pub use loader::{load_config, load_config_from, DEFAULT_CONFIG};
