use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::{abbreviate, output_data, output_empty_collection, output_success};
use crate::cli::{require_session, OutputFormat};
use crate::navigation::Route;
use crate::types::{ChildInput, ChildProfile, FilteringLevel};
use crate::App;

#[derive(Subcommand)]
pub enum ChildCommands {
    #[command(about = "List monitored child profiles")]
    List,

    #[command(about = "Show one child profile")]
    Show {
        #[arg(help = "Child profile ID")]
        id: String,
    },

    #[command(about = "Add a child profile")]
    Add {
        #[arg(help = "Child name")]
        name: String,
        #[arg(long, help = "Device identifier reported by the browser agent")]
        device_id: Option<String>,
        #[arg(long, value_parser = parse_level, help = "Filtering level: strict, moderate or relaxed")]
        level: Option<FilteringLevel>,
    },

    #[command(about = "Update a child profile")]
    Update {
        #[arg(help = "Child profile ID")]
        id: String,
        #[arg(long, help = "New name")]
        name: Option<String>,
        #[arg(long, help = "New device identifier")]
        device_id: Option<String>,
        #[arg(long, value_parser = parse_level, help = "Filtering level: strict, moderate or relaxed")]
        level: Option<FilteringLevel>,
        #[arg(long, conflicts_with = "pause", help = "Resume monitoring")]
        resume: bool,
        #[arg(long, help = "Pause monitoring")]
        pause: bool,
    },

    #[command(about = "Remove a child profile")]
    Remove {
        #[arg(help = "Child profile ID")]
        id: String,
    },
}

fn parse_level(value: &str) -> Result<FilteringLevel, String> {
    FilteringLevel::parse(value).ok_or_else(|| format!("unknown filtering level '{}'", value))
}

pub async fn handle(app: &App, cmd: ChildCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    require_session(app, Route::Children).await?;
    let api = &app.api().child;

    match cmd {
        ChildCommands::List => {
            let children = api.list().await?;
            if children.is_empty() {
                return output_empty_collection(
                    &output_format,
                    "children",
                    "No profiles added. Create the first one with `phishguard child add <name>`",
                );
            }
            output_data(&output_format, json!({ "children": children }), || {
                children.iter().map(child_line).collect()
            })
        }
        ChildCommands::Show { id } => {
            let child = api.get(&id).await?;
            output_data(&output_format, json!({ "child": child }), || vec![child_line(&child)])
        }
        ChildCommands::Add { name, device_id, level } => {
            let input = ChildInput {
                name: Some(name),
                device_id,
                filtering_level: level,
                is_active: None,
            };
            let child = api.add(&input).await?;
            output_success(
                &output_format,
                &format!("Added {} ({})", child.name, child.id),
                Some(json!({ "child": child })),
            )
        }
        ChildCommands::Update { id, name, device_id, level, resume, pause } => {
            let is_active = match (resume, pause) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            };
            let input = ChildInput {
                name,
                device_id,
                filtering_level: level,
                is_active,
            };
            let child = api.update(&id, &input).await?;
            output_success(
                &output_format,
                &format!("Updated {}", child.name),
                Some(json!({ "child": child })),
            )
        }
        ChildCommands::Remove { id } => {
            api.remove(&id).await?;
            output_success(&output_format, &format!("Removed child profile {}", id), None)
        }
    }
}

fn child_line(child: &ChildProfile) -> String {
    let status = if child.is_active { "Active" } else { "Paused" };
    let device = child
        .device_id
        .as_deref()
        .map(|id| abbreviate(id, 10))
        .unwrap_or_else(|| "-".to_string());
    format!(
        "{:<20} {:<7} {:<9} Device: {}",
        child.name,
        status,
        child.filtering_level.as_str(),
        device
    )
}
