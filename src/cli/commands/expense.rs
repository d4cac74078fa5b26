use gasto_core::{parse_amount_input, CurrencyFormatter, DateFormatter, ExpenseQuery};
use gasto_domain::{ExpenseCategory, ExpenseDraft};

use super::{expect_args, CommandDefinition};
use crate::cli::context::{short_id, CommandError, CommandResult, ShellContext};
use crate::cli::output;

const ADD_USAGE: &str = "add <amount> <date|today> <description> [category]";
const EDIT_USAGE: &str =
    "edit <id> [--amount n] [--date d] [--description text] [--category name]";
const LIST_USAGE: &str = "list [search] [--category name]";

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new("add", "Record a new expense", ADD_USAGE, cmd_add),
        CommandDefinition::new("edit", "Change fields of an expense", EDIT_USAGE, cmd_edit),
        CommandDefinition::new("delete", "Delete an expense", "delete <id>", cmd_delete),
        CommandDefinition::new(
            "list",
            "List expenses, newest first",
            LIST_USAGE,
            cmd_list,
        ),
    ]
}

fn cmd_add(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    expect_args(args, 3, 4, ADD_USAGE)?;
    let amount = parse_amount(args[0])?;
    let date = context.parse_date(args[1])?;
    let category = match args.get(3) {
        Some(raw) => parse_category(raw)?,
        None => ExpenseCategory::Other,
    };
    let id = context
        .session
        .add_expense(ExpenseDraft::new(amount, date, args[2], category))?;
    output::success(format!(
        "Added {} {} on {} ({}).",
        short_id(id),
        context.formatter.format_amount(amount),
        context.formatter.format_date(date),
        category.label()
    ));
    Ok(())
}

fn cmd_edit(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let Some((reference, options)) = args.split_first() else {
        return Err(CommandError::InvalidArguments(format!("usage: {}", EDIT_USAGE)));
    };
    let record = context.resolve_expense(reference)?;
    let mut amount = record.amount;
    let mut date = record.date;
    let mut description = record.description.clone();
    let mut category = record.category;

    let mut options = options.iter();
    let mut changed = false;
    while let Some(flag) = options.next() {
        let value = options.next().ok_or_else(|| {
            CommandError::InvalidArguments(format!("missing value for `{}`", flag))
        })?;
        match *flag {
            "--amount" => amount = parse_amount(value)?,
            "--date" => date = Some(context.parse_date(value)?),
            "--description" => description = value.to_string(),
            "--category" => category = parse_category(value)?,
            other => {
                return Err(CommandError::InvalidArguments(format!(
                    "unknown option `{}`; usage: {}",
                    other, EDIT_USAGE
                )))
            }
        }
        changed = true;
    }
    if !changed {
        return Err(CommandError::InvalidArguments(format!("usage: {}", EDIT_USAGE)));
    }

    let date = date.ok_or_else(|| {
        CommandError::InvalidArguments("stored date is unusable; pass --date".into())
    })?;
    context.session.update_expense(
        record.id,
        ExpenseDraft::new(amount, date, description, category),
    )?;
    output::success(format!("Updated {}.", short_id(record.id)));
    Ok(())
}

fn cmd_delete(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    expect_args(args, 1, 1, "delete <id>")?;
    let record = context.resolve_expense(args[0])?;
    let prompt = format!(
        "Delete `{}` ({})?",
        record.description,
        context.formatter.format_amount(record.amount)
    );
    if !context.confirm(&prompt)? {
        output::info("Kept.");
        return Ok(());
    }
    context.session.delete_expense(record.id)?;
    output::success(format!("Deleted {}.", short_id(record.id)));
    Ok(())
}

fn cmd_list(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    context.require_user()?;
    let mut query = ExpenseQuery::all();
    let mut terms = Vec::new();
    let mut args = args.iter();
    while let Some(arg) = args.next() {
        if *arg == "--category" {
            let raw = args.next().ok_or_else(|| {
                CommandError::InvalidArguments(format!("usage: {}", LIST_USAGE))
            })?;
            query = query.with_category(parse_category(raw)?);
        } else {
            terms.push(*arg);
        }
    }
    if !terms.is_empty() {
        query = query.with_search(terms.join(" "));
    }

    let listing = context.session.expenses(&query);
    if listing.records.is_empty() {
        output::info("No expenses found.");
    } else {
        output::section("Expenses");
        for record in &listing.records {
            let date = record
                .date
                .map(|date| context.formatter.format_date(date))
                .unwrap_or_else(|| "--/--/----".to_string());
            output::info(format!(
                "  {}  {}  {:>14}  {:<10} {}",
                short_id(record.id),
                date,
                context.formatter.format_amount(record.amount),
                output::paint_hex(record.category.label(), record.category.color()),
                record.description
            ));
        }
    }
    output::info(format!(
        "Total (incl. fixed expenses): {}",
        context.formatter.format_amount(listing.total)
    ));
    Ok(())
}

fn parse_amount(raw: &str) -> Result<f64, CommandError> {
    match parse_amount_input(raw) {
        Some(amount) if amount > 0.0 => Ok(amount),
        _ => Err(CommandError::InvalidArguments(format!(
            "invalid amount `{}`; enter a number greater than zero",
            raw
        ))),
    }
}

fn parse_category(raw: &str) -> Result<ExpenseCategory, CommandError> {
    ExpenseCategory::parse_known(raw).ok_or_else(|| {
        let known: Vec<_> = ExpenseCategory::ALL.iter().map(|c| c.key()).collect();
        CommandError::InvalidArguments(format!(
            "unknown category `{}` (one of: {})",
            raw,
            known.join(", ")
        ))
    })
}
