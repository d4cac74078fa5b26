use gasto_core::DateFormatter;
use gasto_domain::DateRange;

use super::{expect_args, CommandDefinition};
use crate::cli::context::{CommandResult, ShellContext};
use crate::cli::output;

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new(
            "range",
            "Show or set the dashboard date range",
            "range [from to]",
            cmd_range,
        ),
        CommandDefinition::new("from", "Move the range start", "from <date>", cmd_from),
        CommandDefinition::new("to", "Move the range end", "to <date>", cmd_to),
        CommandDefinition::new(
            "month",
            "Reset the range to the current month",
            "month",
            cmd_month,
        ),
    ]
}

fn cmd_range(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    if args.is_empty() {
        report(context, context.session.range());
        return Ok(());
    }
    expect_args(args, 2, 2, "range [from to]")?;
    let from = context.parse_date(args[0])?;
    let to = context.parse_date(args[1])?;
    let range = context.session.set_range(DateRange::new(from, to));
    report(context, range);
    Ok(())
}

fn cmd_from(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    expect_args(args, 1, 1, "from <date>")?;
    let from = context.parse_date(args[0])?;
    let range = context.session.set_range_start(from);
    report(context, range);
    Ok(())
}

fn cmd_to(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    expect_args(args, 1, 1, "to <date>")?;
    let to = context.parse_date(args[0])?;
    let range = context.session.set_range_end(to);
    report(context, range);
    Ok(())
}

fn cmd_month(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let range = context.session.reset_range();
    report(context, range);
    Ok(())
}

fn report(context: &ShellContext, range: DateRange) {
    output::info(format!(
        "Range: {} to {} ({} days)",
        context.formatter.format_date(range.from()),
        context.formatter.format_date(range.to()),
        range.day_count()
    ));
}
