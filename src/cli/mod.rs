pub mod commands;
pub mod utils;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::config;
use crate::guard::Access;
use crate::navigation::Route;
use crate::types::UserSummary;
use crate::App;

#[derive(Parser)]
#[command(name = "phishguard")]
#[command(about = "PhishGuard Sentinel - parental monitoring dashboard client")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Sign in, sign out and account management")]
    Auth {
        #[command(subcommand)]
        cmd: commands::auth::AuthCommands,
    },

    #[command(about = "Child profile management")]
    Child {
        #[command(subcommand)]
        cmd: commands::child::ChildCommands,
    },

    #[command(about = "Browsing activity and threat analytics")]
    Activity {
        #[command(subcommand)]
        cmd: commands::activity::ActivityCommands,
    },

    #[command(about = "Security overview for the last few days")]
    Dashboard,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

/// Run one command and report its outcome; errors are printed here
pub async fn run(cli: Cli) -> ExitCode {
    let output_format = OutputFormat::from_cli(&cli);

    let result = match App::from_config(config::config().clone()) {
        Ok(app) => dispatch(&app, cli.command, output_format).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let (message, code) = utils::describe_error(&e);
            if let Err(print_err) = utils::output_error(&output_format, &message, Some(code)) {
                eprintln!("Error: {} ({})", message, print_err);
            }
            ExitCode::FAILURE
        }
    }
}

async fn dispatch(app: &App, command: Commands, output_format: OutputFormat) -> anyhow::Result<()> {
    match command {
        Commands::Auth { cmd } => commands::auth::handle(app, cmd, output_format).await,
        Commands::Child { cmd } => commands::child::handle(app, cmd, output_format).await,
        Commands::Activity { cmd } => commands::activity::handle(app, cmd, output_format).await,
        Commands::Dashboard => commands::dashboard::handle(app, output_format).await,
    }
}

/// Run the startup check and the access guard for a protected view
pub async fn require_session(app: &App, route: Route) -> anyhow::Result<UserSummary> {
    app.start().await;

    match app.open(route) {
        Access::Render => app
            .session()
            .state()
            .user
            .ok_or_else(|| anyhow::anyhow!("Not signed in")),
        Access::Redirect(_) => Err(anyhow::anyhow!(
            "Not signed in. Run `phishguard auth login <email>` to open {}",
            route.label()
        )),
        Access::Loading => Err(anyhow::anyhow!("Session check did not complete")),
    }
}
