//! Shell state shared by every command handler, plus dispatch and error reporting.

use std::{env, io, path::PathBuf, sync::Arc};

use chrono::NaiveDate;
use dialoguer::{theme::ColorfulTheme, Confirm};
use gasto_config::{Config, ConfigError, ConfigManager};
use gasto_core::{
    Clock, CoreError, CurrencyLocale, DashboardSession, ExpenseQuery,
    LocaleFormatter, SystemClock,
};
use gasto_domain::ExpenseRecord;
use gasto_storage_json::JsonExpenseStore;
use strsim::levenshtein;
use uuid::Uuid;

use super::{
    commands::{self, CommandDefinition, CommandRegistry},
    output,
    presenter::TerminalPresenter,
};
use crate::errors::CliError;

/// Overrides the base directory holding `config/` and the default data root.
pub const HOME_ENV: &str = "GASTO_HOME";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliMode {
    Interactive,
    Script,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoopControl {
    Continue,
    Exit,
}

pub type CommandResult = Result<(), CommandError>;

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("Not signed in. Use `login <user>` first.")]
    NotSignedIn,
    #[error("{0}")]
    InvalidArguments(String),
    #[error(transparent)]
    Core(CoreError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Dialoguer(#[from] dialoguer::Error),
    #[error("exit requested")]
    ExitRequested,
}

impl From<CoreError> for CommandError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotAuthenticated => CommandError::NotSignedIn,
            CoreError::Validation(message) => CommandError::InvalidArguments(message),
            other => CommandError::Core(other),
        }
    }
}

pub struct ShellContext {
    pub mode: CliMode,
    pub registry: CommandRegistry,
    pub session: DashboardSession,
    pub presenter: Arc<TerminalPresenter>,
    pub formatter: Arc<LocaleFormatter>,
    pub clock: Arc<dyn Clock>,
    pub theme: ColorfulTheme,
    pub config: Config,
    pub config_manager: ConfigManager,
    pub running: bool,
}

impl ShellContext {
    pub fn new(mode: CliMode) -> Result<Self, CliError> {
        let base = match env::var_os(HOME_ENV) {
            Some(path) => PathBuf::from(path),
            None => Config::default().resolve_data_dir(),
        };
        let config_manager = ConfigManager::with_base_dir(base.clone())?;
        let config = config_manager.load()?;
        let data_root = config.data_dir.clone().unwrap_or(base);

        output::set_preferences(output::OutputPreferences {
            color: config.ui_color_enabled && mode == CliMode::Interactive,
        });

        let locale = CurrencyLocale::for_tag(&config.locale)
            .unwrap_or_else(|| {
                tracing::warn!(locale = %config.locale, "unknown locale, using default");
                CurrencyLocale::default()
            })
            .with_currency(&config.currency);
        let formatter = Arc::new(LocaleFormatter::new(locale));
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let store = Arc::new(JsonExpenseStore::new(data_root)?);
        let presenter = Arc::new(TerminalPresenter::new(Arc::clone(&formatter)));
        let session = DashboardSession::new(
            store.clone(),
            store,
            presenter.clone(),
            Arc::clone(&clock),
            formatter.clone(),
        );

        tracing::info!(
            config = %config_manager.config_path().display(),
            ?mode,
            "shell ready"
        );

        Ok(Self {
            mode,
            registry: CommandRegistry::new(commands::all_definitions()),
            session,
            presenter,
            formatter,
            clock,
            theme: ColorfulTheme::default(),
            config,
            config_manager,
            running: true,
        })
    }

    pub(crate) fn dispatch(
        &mut self,
        command: &str,
        raw: &str,
        args: &[&str],
    ) -> Result<LoopControl, CommandError> {
        if let Some(definition) = self.registry.get(command) {
            let handler = definition.handler;
            match handler(self, args) {
                Ok(()) => Ok(LoopControl::Continue),
                Err(CommandError::ExitRequested) => Ok(LoopControl::Exit),
                Err(err) => Err(err),
            }
        } else {
            self.suggest_command(raw);
            Ok(LoopControl::Continue)
        }
    }

    pub(crate) fn suggest_command(&self, input: &str) {
        output::warning(format!(
            "Unknown command `{}`. Type `help` to see available commands.",
            input
        ));

        let needle = input.to_lowercase();
        let mut suggestions: Vec<_> = self
            .registry
            .names()
            .map(|key| (levenshtein(key, &needle), key))
            .collect();
        suggestions.sort_by_key(|(distance, _)| *distance);

        if let Some((distance, best)) = suggestions.first() {
            if *distance <= 3 {
                output::info(format!("Suggestion: `{}`?", best));
            }
        }
    }

    pub(crate) fn command(&self, name: &str) -> Option<&CommandDefinition> {
        self.registry.get(name)
    }

    pub(crate) fn command_names(&self) -> Vec<&'static str> {
        self.registry.names().collect()
    }

    pub(crate) fn report_error(&self, err: CommandError) -> Result<(), CliError> {
        match err {
            CommandError::ExitRequested => Ok(()),
            CommandError::InvalidArguments(message) => {
                output::error(&message);
                output::hint("Use `help <command>` for usage details.");
                Ok(())
            }
            CommandError::NotSignedIn => {
                output::error(CommandError::NotSignedIn);
                output::hint("Try `login alice` to get started.");
                Ok(())
            }
            other => {
                output::error(other);
                Ok(())
            }
        }
    }

    /// Asks for confirmation in interactive mode; scripts always proceed.
    pub(crate) fn confirm(&self, prompt: &str) -> Result<bool, CommandError> {
        if self.mode == CliMode::Script {
            return Ok(true);
        }
        Ok(Confirm::with_theme(&self.theme)
            .with_prompt(prompt)
            .default(false)
            .interact()?)
    }

    pub(crate) fn confirm_exit(&self) -> Result<bool, CliError> {
        self.confirm("Exit shell?")
            .map_err(|err| CliError::Command(err.to_string()))
    }

    pub(crate) fn prompt(&self) -> String {
        match self.session.current_user() {
            Some(user) => format!("gasto({})> ", user),
            None => "gasto> ".to_string(),
        }
    }

    pub(crate) fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Accepts `today`, `yesterday`, or `YYYY-MM-DD`.
    pub(crate) fn parse_date(&self, input: &str) -> Result<NaiveDate, CommandError> {
        match input.to_lowercase().as_str() {
            "today" => Ok(self.today()),
            "yesterday" => self
                .today()
                .pred_opt()
                .ok_or_else(|| CommandError::InvalidArguments("date out of range".into())),
            _ => parse_date(input),
        }
    }

    /// Finds an expense of the signed-in user by full id or unique id prefix.
    pub(crate) fn resolve_expense(&self, reference: &str) -> Result<ExpenseRecord, CommandError> {
        self.require_user()?;
        if let Ok(id) = Uuid::parse_str(reference) {
            return self
                .session
                .expense(id)
                .ok_or(CommandError::Core(CoreError::ExpenseNotFound(id)));
        }

        let prefix = reference.to_lowercase();
        let listing = self.session.expenses(&ExpenseQuery::all());
        let mut matches = listing
            .records
            .into_iter()
            .filter(|record| short_id(record.id).starts_with(&prefix));
        match (matches.next(), matches.next()) {
            (Some(record), None) if !prefix.is_empty() => Ok(record),
            (Some(_), Some(_)) => Err(CommandError::InvalidArguments(format!(
                "id prefix `{}` matches more than one expense",
                reference
            ))),
            _ => Err(CommandError::InvalidArguments(format!(
                "no expense matches `{}`",
                reference
            ))),
        }
    }

    pub(crate) fn require_user(&self) -> Result<(), CommandError> {
        match self.session.current_user() {
            Some(_) => Ok(()),
            None => Err(CommandError::NotSignedIn),
        }
    }
}

pub(crate) fn parse_date(input: &str) -> Result<NaiveDate, CommandError> {
    NaiveDate::parse_from_str(input, "%Y-%m-%d").map_err(|_| {
        CommandError::InvalidArguments(format!("invalid date `{}` (use YYYY-MM-DD)", input))
    })
}

pub(crate) fn short_id(id: Uuid) -> String {
    let mut short = id.simple().to_string();
    short.truncate(8);
    short
}
