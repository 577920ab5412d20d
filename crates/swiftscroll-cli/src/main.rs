use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "swiftscroll")]
#[command(author, version, about = "Physics-shaped smooth scrolling for the mouse wheel")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Install the wheel hook and run until interrupted
    Run,
    /// Manage the start-with-Windows registration
    Autostart {
        #[command(subcommand)]
        action: AutostartAction,
    },
    /// Inspect or reset the settings file
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Subcommand)]
enum AutostartAction {
    /// Register the current executable in the Run key
    Enable,
    /// Remove the Run key registration
    Disable,
    /// Show whether autostart is registered
    Status,
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Print the settings file path
    Path,
    /// Print the effective settings as JSON
    Show,
    /// Overwrite the settings file with compiled defaults
    Reset,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Run) | None => commands::run::run().await,
        Some(Commands::Autostart { action }) => match action {
            AutostartAction::Enable => commands::autostart::enable(),
            AutostartAction::Disable => commands::autostart::disable(),
            AutostartAction::Status => commands::autostart::status(),
        },
        Some(Commands::Settings { action }) => match action {
            SettingsAction::Path => commands::settings::path(),
            SettingsAction::Show => commands::settings::show(),
            SettingsAction::Reset => commands::settings::reset(),
        },
    }
}
