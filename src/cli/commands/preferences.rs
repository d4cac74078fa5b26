use gasto_core::CurrencyLocale;

use super::{expect_args, CommandDefinition};
use crate::cli::context::{CliMode, CommandError, CommandResult, ShellContext};
use crate::cli::output;

const USAGE: &str = "prefs [locale <tag> | currency <code> | color <on|off>]";

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![CommandDefinition::new(
        "prefs",
        "Show or change display preferences",
        USAGE,
        cmd_prefs,
    )]
}

fn cmd_prefs(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    if args.is_empty() {
        let config = &context.config;
        output::section("Preferences");
        output::info(format!("  Locale   : {}", config.locale));
        output::info(format!("  Currency : {}", config.currency));
        output::info(format!(
            "  Colors   : {}",
            if config.ui_color_enabled { "on" } else { "off" }
        ));
        output::info(format!(
            "  Config   : {}",
            context.config_manager.config_path().display()
        ));
        return Ok(());
    }

    expect_args(args, 2, 2, USAGE)?;
    let value = args[1];
    let mut updated = context.config.clone();
    match args[0].to_lowercase().as_str() {
        "locale" => {
            let locale = CurrencyLocale::for_tag(value).ok_or_else(|| {
                CommandError::InvalidArguments(format!(
                    "unknown locale `{}` (one of: es-AR, pt-BR, en-US)",
                    value
                ))
            })?;
            updated.locale = locale.language_tag;
        }
        "currency" => {
            let code = value.trim().to_uppercase();
            if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
                return Err(CommandError::InvalidArguments(format!(
                    "invalid currency code `{}`",
                    value
                )));
            }
            updated.currency = code;
        }
        "color" => {
            updated.ui_color_enabled = match value.to_lowercase().as_str() {
                "on" | "true" | "yes" => true,
                "off" | "false" | "no" => false,
                _ => return Err(CommandError::InvalidArguments(format!("usage: {}", USAGE))),
            };
            output::set_preferences(output::OutputPreferences {
                color: updated.ui_color_enabled && context.mode == CliMode::Interactive,
            });
        }
        _ => return Err(CommandError::InvalidArguments(format!("usage: {}", USAGE))),
    }

    context.config_manager.save(&updated)?;
    context.config = updated;
    output::success("Preferences saved. Locale and currency apply on the next start.");
    Ok(())
}
