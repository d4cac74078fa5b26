use gasto_core::{parse_setting, CoreError, CurrencyFormatter};
use gasto_domain::{parse_leading_number, ConfigField, ConfigurationPatch};

use super::{expect_args, CommandDefinition};
use crate::cli::context::{CommandError, CommandResult, ShellContext};
use crate::cli::output;
use crate::cli::presenter::{dashboard_lines, SummaryReport};

const RESET_USAGE: &str = "reset <budget|fixed|limit>";

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new(
            "budget",
            "Show budget settings or set the monthly budget",
            "budget [amount]",
            cmd_budget,
        ),
        CommandDefinition::new(
            "fixed",
            "Set the monthly fixed expenses",
            "fixed <amount>",
            cmd_fixed,
        ),
        CommandDefinition::new(
            "limit",
            "Set the spending limit that triggers alerts",
            "limit <amount>",
            cmd_limit,
        ),
        CommandDefinition::new("reset", "Clear one budget setting", RESET_USAGE, cmd_reset),
        CommandDefinition::new(
            "summary",
            "Show the dashboard for the current range",
            "summary [--json]",
            cmd_summary,
        ),
    ]
}

fn cmd_budget(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    if args.is_empty() {
        context.require_user()?;
        let configuration = context.session.configuration();
        output::section("Budget settings");
        for field in ConfigField::ALL {
            let value = if configuration.is_set(field) {
                context.formatter.format_amount(configuration.get(field))
            } else {
                "not set".to_string()
            };
            output::info(format!("  {:<16} {}", field.to_string(), value));
        }
        return Ok(());
    }
    set_field(context, ConfigField::MonthlyBudget, args, "budget [amount]")
}

fn cmd_fixed(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    set_field(context, ConfigField::FixedExpenses, args, "fixed <amount>")
}

fn cmd_limit(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    set_field(context, ConfigField::SpendingLimit, args, "limit <amount>")
}

fn cmd_reset(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    expect_args(args, 1, 1, RESET_USAGE)?;
    let field = match args[0].to_lowercase().as_str() {
        "budget" | "monthly_budget" => ConfigField::MonthlyBudget,
        "fixed" | "fixed_expenses" => ConfigField::FixedExpenses,
        "limit" | "spending_limit" => ConfigField::SpendingLimit,
        _ => return Err(CommandError::InvalidArguments(format!("usage: {}", RESET_USAGE))),
    };
    context.session.reset_configuration_field(field)?;
    output::success(format!("{} cleared.", field));
    Ok(())
}

fn cmd_summary(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    expect_args(args, 0, 1, "summary [--json]")?;
    let json = match args.first() {
        None => false,
        Some(&"--json") => true,
        Some(other) => {
            return Err(CommandError::InvalidArguments(format!(
                "unknown option `{}`; usage: summary [--json]",
                other
            )))
        }
    };

    let summary = context.session.summary()?;
    if json {
        let report = serde_json::to_string_pretty(&SummaryReport::from(&summary))
            .map_err(|err| CoreError::Serde(err.to_string()))?;
        output::info(report);
        return Ok(());
    }

    output::section("Dashboard");
    for line in dashboard_lines(&summary, &context.formatter) {
        output::info(line);
    }
    Ok(())
}

fn set_field(
    context: &mut ShellContext,
    field: ConfigField,
    args: &[&str],
    usage: &str,
) -> CommandResult {
    expect_args(args, 1, 1, usage)?;
    let value = parse_value(args[0])?;
    let patch = ConfigurationPatch::single(field, value);
    let configuration = context.session.update_configuration(&patch)?;
    output::success(format!(
        "{} set to {}.",
        field,
        context.formatter.format_amount(configuration.get(field))
    ));
    Ok(())
}

/// Settings take the leading number of the input; input with no number at all is rejected.
fn parse_value(raw: &str) -> Result<f64, CommandError> {
    if parse_leading_number(raw).is_none() {
        return Err(CommandError::InvalidArguments(format!(
            "invalid amount `{}`",
            raw
        )));
    }
    Ok(parse_setting(Some(raw)))
}
