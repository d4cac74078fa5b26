//! gasto-config
//!
//! Persistent application preferences: display locale, currency, and data directory.
//! Owns the Config data structure plus disk persistence helpers.

pub mod error;
pub mod manager;
pub mod model;
pub mod persistence;

pub use error::ConfigError;
pub use manager::ConfigManager;
pub use model::Config;
pub use persistence::write_atomic;
