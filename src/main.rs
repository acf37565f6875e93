// Entrypoint for the CLI application.
// - Reads settings from the environment and sets up logging on stderr.
// - Logs in first; a failed login ends the process with a non-zero status.
// - Then hands the client and the session to the menu loop.

use tracing_subscriber::util::SubscriberInitExt;
use userdir_soap_cli::{
    api::DirectoryClient, config::Settings, session::Session, telemetry::get_subscriber, ui,
};

fn main() -> anyhow::Result<()> {
    let settings = Settings::from_env()?;
    get_subscriber(&settings.log_level, std::io::stderr).init();
    tracing::debug!(base_url = %settings.base_url, "starting");

    let client = DirectoryClient::from_settings(&settings)?;
    let mut session = Session::new();

    ui::check_connectivity(&client);
    ui::login(&client, &mut session)?;
    if !session.is_authenticated() {
        anyhow::bail!("login failed, exiting");
    }
    ui::configure_admin_token(&mut session)?;

    // Blocks until the operator quits.
    ui::main_menu(&client, &mut session)?;
    Ok(())
}
