use gasto_config::ConfigError;
use gasto_core::CoreError;
use rustyline::error::ReadlineError;
use thiserror::Error;

/// Failures that stop the shell itself, as opposed to a single command.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Line editor error: {0}")]
    Readline(#[from] ReadlineError),
    #[error("Command failed: {0}")]
    Command(String),
}
