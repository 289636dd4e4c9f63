use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::{output_data, output_success, resolve_password};
use crate::cli::{require_session, OutputFormat};
use crate::navigation::Route;
use crate::session::SessionPhase;
use crate::types::{RegisterRequest, ResetPasswordRequest};
use crate::App;

#[derive(Subcommand)]
pub enum AuthCommands {
    #[command(about = "Sign in and store the session credential")]
    Login {
        #[arg(help = "Account email")]
        email: String,
        #[arg(long, help = "Password (read from stdin if not provided)")]
        password: Option<String>,
    },

    #[command(about = "Sign out and forget the stored credential")]
    Logout,

    #[command(about = "Show current session state")]
    Status,

    #[command(about = "Show the signed-in parent")]
    Whoami,

    #[command(about = "Create a parent account")]
    Register {
        #[arg(help = "Display name")]
        name: String,
        #[arg(help = "Account email")]
        email: String,
        #[arg(long, help = "Password (read from stdin if not provided)")]
        password: Option<String>,
    },

    #[command(about = "Confirm an email-verification token")]
    Verify {
        #[arg(help = "Token from the verification email")]
        token: String,
    },

    #[command(about = "Request a password-reset email")]
    ForgotPassword {
        #[arg(help = "Account email")]
        email: String,
    },

    #[command(about = "Set a new password with a reset token")]
    ResetPassword {
        #[arg(help = "Token from the reset email")]
        token: String,
        #[arg(long, help = "New password (read from stdin if not provided)")]
        password: Option<String>,
    },
}

pub async fn handle(app: &App, cmd: AuthCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        AuthCommands::Login { email, password } => {
            let password = resolve_password(password)?;
            let user = app.login(&email, &password).await?;
            output_success(
                &output_format,
                &format!("Signed in as {}", user.name),
                Some(json!({ "user": user })),
            )
        }
        AuthCommands::Logout => {
            app.logout();
            output_success(&output_format, "Signed out", None)
        }
        AuthCommands::Status => {
            let state = app.start().await;
            let phase = state.phase();
            let views: Vec<Route> = if state.is_authenticated() {
                Route::NAV.to_vec()
            } else {
                vec![Route::Login, Route::Register]
            };
            output_data(
                &output_format,
                json!({ "phase": phase, "session": state, "views": views }),
                || {
                    let mut lines = match (phase, &state.user) {
                        (SessionPhase::Authenticated, Some(user)) => {
                            vec![format!("Signed in as {} ({})", user.name, user.id)]
                        }
                        _ => vec!["Not signed in".to_string()],
                    };
                    let available: Vec<&str> = views.iter().map(Route::label).collect();
                    lines.push(format!("Available: {}", available.join(", ")));
                    lines
                },
            )
        }
        AuthCommands::Whoami => {
            let user = require_session(app, Route::Overview).await?;
            output_data(&output_format, json!({ "user": user }), || {
                let mut lines = vec![format!("Name: {}", user.name), format!("ID: {}", user.id)];
                if let Some(email) = &user.email {
                    lines.push(format!("Email: {}", email));
                }
                lines
            })
        }
        AuthCommands::Register { name, email, password } => {
            let password = resolve_password(password)?;
            let request = RegisterRequest {
                name,
                email: email.clone(),
                password,
            };
            let response = app.api().auth.register(&request).await?;
            output_success(
                &output_format,
                &format!(
                    "Account created. Check {} for a verification link, then sign in",
                    email
                ),
                Some(json!({ "response": response })),
            )
        }
        AuthCommands::Verify { token } => {
            let response = app.api().auth.verify(&token).await?;
            output_success(
                &output_format,
                "Email verified. You can sign in now",
                Some(json!({ "response": response })),
            )
        }
        AuthCommands::ForgotPassword { email } => {
            app.api().auth.forgot_password(&email).await?;
            output_success(
                &output_format,
                &format!("If {} is registered, a reset link is on its way", email),
                None,
            )
        }
        AuthCommands::ResetPassword { token, password } => {
            let password = resolve_password(password)?;
            let request = ResetPasswordRequest { token, password };
            app.api().auth.reset_password(&request).await?;
            output_success(&output_format, "Password updated. Sign in with the new password", None)
        }
    }
}
