#![doc(test(attr(deny(warnings))))]

//! gasto tracks personal expenses per user, aggregates them over a date range, and checks
//! the result against a monthly budget and a spending limit. The `gasto_cli` binary drives
//! the engine from a terminal.

pub mod cli;
pub mod errors;
pub mod utils;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("gasto tracing initialized.");
    });
}
