//! Single-task maintenance commands.

use clap::Subcommand;
use serde_json::json;
use todosched_core::{TaskApi, TaskUpdate, ValidationError};

use super::{print_json, split_list, CmdResult, Context};

#[derive(Subcommand)]
pub enum TaskAction {
    /// Update a task
    Update {
        /// Task ID
        id: String,
        /// New title
        #[arg(long)]
        content: Option<String>,
        /// New description
        #[arg(long)]
        description: Option<String>,
        /// New priority (1-4)
        #[arg(long)]
        priority: Option<u8>,
        /// New natural-language due date
        #[arg(long)]
        due_string: Option<String>,
        /// Comma-separated labels, replacing the current ones
        #[arg(long)]
        labels: Option<String>,
    },
    /// Delete a task
    Delete {
        /// Task ID
        id: String,
    },
}

fn build_update(
    content: Option<String>,
    description: Option<String>,
    priority: Option<u8>,
    due_string: Option<String>,
    labels: Option<String>,
) -> Result<TaskUpdate, ValidationError> {
    if let Some(p) = priority {
        if !(1..=4).contains(&p) {
            return Err(ValidationError::invalid(
                "priority",
                format!("must be between 1 and 4, got {p}"),
            ));
        }
    }
    let update = TaskUpdate {
        content,
        description,
        labels: labels.as_deref().map(split_list),
        priority,
        due_string,
        ..TaskUpdate::default()
    };
    if update.is_empty() {
        return Err(ValidationError::MissingField(
            "at least one of --content, --description, --priority, --due-string, --labels".into(),
        ));
    }
    Ok(update)
}

pub async fn run(ctx: &Context, action: TaskAction) -> CmdResult {
    let config = ctx.load_config()?;
    let client = ctx.client(&config)?;

    match action {
        TaskAction::Update {
            id,
            content,
            description,
            priority,
            due_string,
            labels,
        } => {
            let update = build_update(content, description, priority, due_string, labels)?;
            let task = client.update_task(&id, &update).await?;
            tracing::info!(id = %task.id, "task updated");
            print_json(&task)?;
        }
        TaskAction::Delete { id } => {
            client.delete_task(&id).await?;
            tracing::info!(%id, "task deleted");
            print_json(&json!({ "deleted": id }))?;
        }
    }
    Ok(())
}
