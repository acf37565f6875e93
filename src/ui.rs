// UI layer: interactive prompts built on `dialoguer`. Everything here is
// presentation; the directory rules live in `api` and `session`. Errors from
// operations are printed and the menu goes on.

use crate::api::DirectoryClient;
use crate::error::ClientResult;
use crate::session::Session;
use crate::transport::Transport;
use crate::user::{Role, User, UserUpdate};
use anyhow::Result;
use crossterm::cursor::MoveTo;
use crossterm::execute;
use crossterm::terminal::{Clear, ClearType};
use dialoguer::{Confirm, Input, Password, Select};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::stdout;
use std::time::Duration;

/// Entries of the main menu, numbered like the operator expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    ListUsers,
    AddUser,
    UpdateUser,
    DeleteUser,
    ConfigureToken,
    Refresh,
    Quit,
}

impl MenuChoice {
    /// Display order: 1 to 6, then 0.
    pub const ALL: [MenuChoice; 7] = [
        MenuChoice::ListUsers,
        MenuChoice::AddUser,
        MenuChoice::UpdateUser,
        MenuChoice::DeleteUser,
        MenuChoice::ConfigureToken,
        MenuChoice::Refresh,
        MenuChoice::Quit,
    ];

    pub fn code(self) -> u8 {
        match self {
            MenuChoice::ListUsers => 1,
            MenuChoice::AddUser => 2,
            MenuChoice::UpdateUser => 3,
            MenuChoice::DeleteUser => 4,
            MenuChoice::ConfigureToken => 5,
            MenuChoice::Refresh => 6,
            MenuChoice::Quit => 0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MenuChoice::ListUsers => "List all users",
            MenuChoice::AddUser => "Add a user",
            MenuChoice::UpdateUser => "Update a user",
            MenuChoice::DeleteUser => "Delete a user",
            MenuChoice::ConfigureToken => "Configure the admin token",
            MenuChoice::Refresh => "Refresh the list",
            MenuChoice::Quit => "Quit",
        }
    }

    /// Mutating entries are refused up front without an admin token.
    pub fn requires_admin_token(self) -> bool {
        matches!(
            self,
            MenuChoice::AddUser | MenuChoice::UpdateUser | MenuChoice::DeleteUser
        )
    }
}

/// Check the server before asking for credentials. Only warns.
pub fn check_connectivity<T: Transport>(client: &DirectoryClient<T>) {
    match with_spinner("Checking server...", || client.health()) {
        Ok(health) => println!("Server reachable (status: {})", health.status),
        Err(e) => println!("Warning: health check failed: {}", e),
    }
    match with_spinner("Checking SOAP endpoint...", || client.probe_service_description()) {
        Ok(true) => println!("SOAP endpoint reachable, WSDL published"),
        Ok(false) => println!("SOAP endpoint reachable (no WSDL in the answer)"),
        Err(e) => println!("Warning: SOAP endpoint check failed: {}", e),
    }
}

/// Ask for credentials and log in. A failure is printed and leaves the
/// session unauthenticated.
pub fn login<T: Transport>(client: &DirectoryClient<T>, session: &mut Session) -> Result<()> {
    clear_screen()?;
    print_header();
    println!("LOGIN");
    println!("{}", "-".repeat(30));

    let username: String = Input::new()
        .with_prompt("Username")
        .allow_empty(true)
        .interact_text()?;
    let password: String = Password::new()
        .with_prompt("Password")
        .allow_empty_password(true)
        .interact()?;

    let outcome = with_spinner("Authenticating...", || client.login(session, &username, &password));
    match outcome {
        Ok(role) => {
            match role {
                Some(role) => println!("Authenticated! Role: {}", role),
                None => println!("Authenticated!"),
            }
        }
        Err(e) => println!("Authentication failed: {}", e),
    }
    Ok(())
}

/// Prompt for the administrative token. An empty answer leaves it unset.
pub fn configure_admin_token(session: &mut Session) -> Result<()> {
    println!();
    println!("ADMIN TOKEN");
    println!("{}", "-".repeat(40));
    println!("Administration features need a token generated from the");
    println!("web administration interface.");
    println!();

    let token: String = Input::new()
        .with_prompt("Admin token (Enter to skip)")
        .allow_empty(true)
        .interact_text()?;
    let token = token.trim();
    if token.is_empty() {
        println!("No admin token configured. Administration features are unavailable.");
    } else {
        session.set_admin_token(token);
        if let Some(preview) = session.admin_token_preview() {
            println!("Admin token set: {}", preview);
        }
    }
    Ok(())
}

/// Main interactive menu. Runs until the operator picks "Quit".
pub fn main_menu<T: Transport>(client: &DirectoryClient<T>, session: &mut Session) -> Result<()> {
    loop {
        clear_screen()?;
        print_header();
        match (session.current_user(), session.role()) {
            (Some(user), Some(role)) => println!("Logged in as: {} ({})", user, role),
            (Some(user), None) => println!("Logged in as: {}", user),
            _ => {}
        }
        if let Some(preview) = session.admin_token_preview() {
            println!("Admin token: {}", preview);
        }
        println!();

        let items: Vec<String> = MenuChoice::ALL
            .iter()
            .map(|c| format!("{}. {}", c.code(), c.label()))
            .collect();
        let selection = Select::new()
            .with_prompt("Main menu")
            .items(&items)
            .default(0)
            .interact()?;
        let choice = MenuChoice::ALL[selection];

        if choice.requires_admin_token() && !session.has_admin_token() {
            println!("An admin token is required for this operation.");
            pause()?;
            continue;
        }

        match choice {
            MenuChoice::Quit => {
                println!("Goodbye!");
                break;
            }
            MenuChoice::ListUsers | MenuChoice::Refresh => {
                let users = report(with_spinner("Fetching users...", || client.list_users(session)));
                display_users(&users.unwrap_or_default());
                pause()?;
            }
            MenuChoice::AddUser => {
                handle_add(client, session)?;
                pause()?;
            }
            MenuChoice::UpdateUser => {
                handle_update(client, session)?;
                pause()?;
            }
            MenuChoice::DeleteUser => {
                handle_delete(client, session)?;
                pause()?;
            }
            MenuChoice::ConfigureToken => configure_admin_token(session)?,
        }
    }
    Ok(())
}

fn handle_add<T: Transport>(client: &DirectoryClient<T>, session: &Session) -> Result<()> {
    println!();
    println!("ADD USER");
    println!("{}", "-".repeat(25));

    let username: String = Input::new()
        .with_prompt("Username")
        .allow_empty(true)
        .interact_text()?;
    let username = username.trim().to_string();
    if username.is_empty() {
        println!("Username is required");
        return Ok(());
    }
    let password: String = Password::new()
        .with_prompt("Password")
        .allow_empty_password(true)
        .interact()?;
    if password.trim().is_empty() {
        println!("Password is required");
        return Ok(());
    }
    let role = select_role("Role")?;

    let outcome = with_spinner("Adding user...", || client.add_user(session, &username, &password, role));
    match report(outcome) {
        Some(Some(id)) => println!("User created (id {})", id),
        Some(None) => println!("User created"),
        None => {}
    }
    Ok(())
}

fn handle_update<T: Transport>(client: &DirectoryClient<T>, session: &Session) -> Result<()> {
    println!();
    println!("UPDATE USER");
    println!("{}", "-".repeat(30));

    let user_id: i64 = Input::new().with_prompt("User id").interact_text()?;
    println!("Leave blank to keep the current value.");
    let username: String = Input::new()
        .with_prompt("New username")
        .allow_empty(true)
        .interact_text()?;
    let password: String = Password::new()
        .with_prompt("New password")
        .allow_empty_password(true)
        .interact()?;
    let role = if Confirm::new().with_prompt("Change the role?").default(false).interact()? {
        Some(select_role("New role")?)
    } else {
        None
    };

    let update = UserUpdate {
        username: non_blank(username),
        password: non_blank(password),
        role,
    };
    let outcome = with_spinner("Updating user...", || client.update_user(session, user_id, update));
    if report(outcome).is_some() {
        println!("User {} updated", user_id);
    }
    Ok(())
}

fn handle_delete<T: Transport>(client: &DirectoryClient<T>, session: &Session) -> Result<()> {
    println!();
    println!("DELETE USER");
    println!("{}", "-".repeat(30));

    let user_id: i64 = Input::new().with_prompt("User id to delete").interact_text()?;
    let confirmed = Confirm::new()
        .with_prompt(format!("Really delete user {}?", user_id))
        .default(false)
        .interact()?;
    if !confirmed {
        println!("Deletion cancelled");
        return Ok(());
    }

    let outcome = with_spinner("Deleting user...", || client.delete_user(session, user_id));
    if report(outcome).is_some() {
        println!("User {} deleted", user_id);
    }
    Ok(())
}

fn select_role(prompt: &str) -> Result<Role> {
    let labels: Vec<&str> = Role::ALL.iter().map(|r| r.describe()).collect();
    let idx = Select::new()
        .with_prompt(prompt)
        .items(&labels)
        .default(0)
        .interact()?;
    Ok(Role::ALL[idx])
}

/// Render the user table.
pub fn display_users(users: &[User]) {
    if users.is_empty() {
        println!("No users found");
        return;
    }
    println!();
    println!("USERS ({})", users.len());
    println!("{}", "-".repeat(80));
    println!("{:<5} {:<20} {:<15} {:<20}", "ID", "Username", "Role", "Created");
    println!("{}", "-".repeat(80));
    for user in users {
        println!(
            "{:<5} {:<20} {:<15} {:<20}",
            user.id,
            user.username,
            user.role.as_str(),
            user.created_display()
        );
    }
}

/// Print the error of a failed operation; `Some` on success.
fn report<T>(outcome: ClientResult<T>) -> Option<T> {
    match outcome {
        Ok(v) => Some(v),
        Err(e) => {
            println!("Error: {}", e);
            None
        }
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Show a spinner while `f` runs.
fn with_spinner<R>(message: &str, f: impl FnOnce() -> R) -> R {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    let out = f();
    spinner.finish_and_clear();
    out
}

fn pause() -> Result<()> {
    let _: String = Input::new()
        .with_prompt("Press Enter to continue")
        .allow_empty(true)
        .interact_text()?;
    Ok(())
}

fn clear_screen() -> Result<()> {
    execute!(stdout(), Clear(ClearType::All), MoveTo(0, 0))?;
    Ok(())
}

fn print_header() {
    println!("{}", "=".repeat(60));
    println!("{:^60}", "SOAP USER DIRECTORY");
    println!("{}", "=".repeat(60));
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn menu_lists_one_to_six_then_quit() {
        let codes: Vec<u8> = MenuChoice::ALL.into_iter().map(MenuChoice::code).collect();
        assert_eq!(codes, [1, 2, 3, 4, 5, 6, 0]);
        assert_eq!(MenuChoice::ALL.last(), Some(&MenuChoice::Quit));
    }

    #[test]
    fn only_mutations_are_gated_in_the_menu() {
        let gated: Vec<u8> = MenuChoice::ALL
            .into_iter()
            .filter(|c| c.requires_admin_token())
            .map(MenuChoice::code)
            .collect();
        assert_eq!(gated, [2, 3, 4]);
    }

    #[test]
    fn blank_answers_become_none() {
        assert_eq!(non_blank("  ".into()), None);
        assert_eq!(non_blank(" bob ".into()), Some("bob".into()));
    }
}
