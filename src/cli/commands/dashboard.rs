use serde_json::json;

use crate::cli::commands::activity::log_line;
use crate::cli::utils::{abbreviate, output_data};
use crate::cli::{require_session, OutputFormat};
use crate::navigation::Route;
use crate::App;

pub async fn handle(app: &App, output_format: OutputFormat) -> anyhow::Result<()> {
    require_session(app, Route::Overview).await?;

    let view = app.dashboard();
    let snapshot = tokio::select! {
        result = view.activate() => result?,
        _ = tokio::signal::ctrl_c() => {
            view.deactivate();
            anyhow::bail!("Dashboard load interrupted");
        }
    };
    let days = app.config().dashboard.analytics_window_days;

    output_data(&output_format, json!({ "days": days, "dashboard": &*snapshot }), || {
        let mut lines = vec![
            format!("Security Overview - last {} days", days),
            String::new(),
            format!("Monitored profiles: {}", snapshot.monitored_profiles()),
            format!("Total checks:       {}", snapshot.total_checks()),
            format!("Threats blocked:    {}", snapshot.threats_blocked()),
            format!("Block rate:         {}%", snapshot.block_rate_percent),
        ];

        for failed in &snapshot.failures {
            lines.push(format!("(could not load {})", failed));
        }

        lines.push(String::new());
        lines.push(format!("Children ({} profile(s))", snapshot.children.len()));
        if snapshot.children.is_empty() {
            lines.push("  No profiles added.".to_string());
        }
        for child in &snapshot.children {
            let status = if child.is_active { "Active" } else { "Paused" };
            let device = child.device_id.as_deref().map(|id| abbreviate(id, 10)).unwrap_or_default();
            lines.push(format!(
                "  {:<20} {:<7} {:<9} {}",
                child.name,
                status,
                child.filtering_level.as_str(),
                device
            ));
        }

        lines.push(String::new());
        lines.push("Recent threat log".to_string());
        if snapshot.recent_logs.is_empty() {
            lines.push("  No activity logged yet.".to_string());
        }
        for log in &snapshot.recent_logs {
            lines.push(format!("  {}", log_line(log)));
        }
        lines
    })
}
