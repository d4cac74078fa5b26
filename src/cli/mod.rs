mod commands;
mod context;
pub mod output;
mod presenter;
mod shell;

pub use context::{CliMode, HOME_ENV};
pub use shell::{run_cli, SCRIPT_ENV};
