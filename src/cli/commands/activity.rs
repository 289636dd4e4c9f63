use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::{output_data, output_empty_collection};
use crate::cli::{require_session, OutputFormat};
use crate::dashboard::block_rate_percent;
use crate::navigation::Route;
use crate::types::{ActivityLogEntry, AnalyticsQuery, HistoryQuery};
use crate::App;

#[derive(Subcommand)]
pub enum ActivityCommands {
    #[command(about = "Recent browsing activity, newest first")]
    History {
        #[arg(long, help = "Maximum number of entries")]
        limit: Option<u32>,
        #[arg(long, help = "Page number")]
        page: Option<u32>,
        #[arg(long, help = "Only this child profile")]
        child: Option<String>,
        #[arg(long, help = "Only this status (blocked, allowed, ...)")]
        status: Option<String>,
    },

    #[command(about = "Blocked and total checks over a window")]
    Analytics {
        #[arg(long, help = "Window length in days (defaults to the dashboard window)")]
        days: Option<u32>,
        #[arg(long, help = "Only this child profile")]
        child: Option<String>,
    },
}

pub async fn handle(app: &App, cmd: ActivityCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        ActivityCommands::History { limit, page, child, status } => {
            require_session(app, Route::Activity).await?;
            let query = HistoryQuery {
                limit,
                page,
                child_id: child,
                status,
            };
            let history = app.api().activity.history(&query).await?;
            if history.logs.is_empty() {
                return output_empty_collection(&output_format, "logs", "No activity logged yet.");
            }
            output_data(&output_format, json!({ "logs": history.logs, "total": history.total }), || {
                history.logs.iter().map(log_line).collect()
            })
        }
        ActivityCommands::Analytics { days, child } => {
            require_session(app, Route::Analytics).await?;
            let days = days.unwrap_or(app.config().dashboard.analytics_window_days);
            let query = AnalyticsQuery {
                days: Some(days),
                child_id: child,
            };
            let analytics = app.api().activity.analytics(&query).await?;
            let rate = block_rate_percent(&analytics);
            output_data(
                &output_format,
                json!({ "days": days, "analytics": analytics, "blockRatePercent": rate }),
                || {
                    vec![
                        format!("Window:          last {} days", days),
                        format!("Total checks:    {}", analytics.total),
                        format!("Threats blocked: {}", analytics.blocked),
                        format!("Block rate:      {}%", rate),
                    ]
                },
            )
        }
    }
}

pub(crate) fn log_line(log: &ActivityLogEntry) -> String {
    let child = log
        .child
        .as_ref()
        .and_then(|c| c.name())
        .unwrap_or("Unknown child");
    let time = log
        .timestamp
        .map(|t| t.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".repeat(19));
    format!(
        "{} {:<8} {:<40} {}",
        time,
        log.status.as_str(),
        log.target(),
        child
    )
}
