//! gasto-domain
//!
//! Pure domain models (expenses, categories, budget configuration, date ranges).
//! No I/O, no CLI, no storage. Only data types and the coercion rules they carry.

pub mod category;
pub mod common;
pub mod configuration;
pub mod expense;
pub mod range;

pub use category::*;
pub use common::*;
pub use configuration::*;
pub use expense::*;
pub use range::*;
