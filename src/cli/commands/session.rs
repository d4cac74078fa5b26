use gasto_core::AuthEvent;
use gasto_domain::UserId;

use super::{expect_args, CommandDefinition};
use crate::cli::context::{CommandError, CommandResult, ShellContext};
use crate::cli::output;

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new(
            "login",
            "Sign in and load the user's expenses",
            "login <user>",
            cmd_login,
        ),
        CommandDefinition::new("logout", "Sign out", "logout", cmd_logout),
        CommandDefinition::new("whoami", "Show the signed-in user", "whoami", cmd_whoami),
    ]
}

fn cmd_login(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    expect_args(args, 1, 1, "login <user>")?;
    let name = args[0].trim();
    if name.is_empty() {
        return Err(CommandError::InvalidArguments("user name is empty".into()));
    }
    context
        .session
        .handle_auth_event(AuthEvent::LoggedIn(UserId::new(name)))?;
    let listing = context.session.expenses(&Default::default());
    output::success(format!(
        "Signed in as {} ({} expenses).",
        name,
        listing.records.len()
    ));
    for line in context.presenter.latest_lines().unwrap_or_default() {
        output::info(line);
    }
    Ok(())
}

fn cmd_logout(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    context.require_user()?;
    context.session.handle_auth_event(AuthEvent::LoggedOut)?;
    output::success("Signed out.");
    Ok(())
}

fn cmd_whoami(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    match context.session.current_user() {
        Some(user) => output::info(format!("Signed in as {}.", user)),
        None => output::info("Not signed in."),
    }
    Ok(())
}
