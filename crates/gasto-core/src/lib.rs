//! gasto-core
//!
//! Expense aggregation, budget evaluation, and the session host that keeps them current.
//! Depends on gasto-domain. No CLI, no terminal I/O, no direct storage interactions.

pub mod aggregation_service;
pub mod alert_service;
pub mod config_store;
pub mod error;
pub mod expense_service;
pub mod format;
pub mod repository;
pub mod session;
pub mod time;

pub use aggregation_service::*;
pub use alert_service::*;
pub use config_store::*;
pub use error::CoreError;
pub use expense_service::*;
pub use format::*;
pub use repository::*;
pub use session::*;
pub use time::*;

#[cfg(test)]
mod tests;
