use chrono::NaiveDate;
use clap::Args;
use todosched_core::{run_query, TaskQuery};

use super::{print_json, CmdResult, Context};

#[derive(Args)]
pub struct QueryArgs {
    /// Project name (repeatable)
    #[arg(long = "project", value_name = "NAME")]
    projects: Vec<String>,
    /// Label name (repeatable); a task matches if it has any of them
    #[arg(long = "label", value_name = "NAME")]
    labels: Vec<String>,
    /// First due date, YYYY-MM-DD
    #[arg(long)]
    from: Option<NaiveDate>,
    /// Last due date, YYYY-MM-DD
    #[arg(long)]
    to: Option<NaiveDate>,
    /// Maximum number of tasks
    #[arg(long)]
    limit: Option<usize>,
    /// Timezone for the date bounds
    #[arg(long)]
    timezone: Option<String>,
}

impl From<QueryArgs> for TaskQuery {
    fn from(args: QueryArgs) -> Self {
        TaskQuery {
            project_names: args.projects,
            labels: args.labels,
            date_from: args.from,
            date_to: args.to,
            limit: args.limit,
            timezone: args.timezone,
        }
    }
}

pub async fn run(ctx: &Context, args: QueryArgs) -> CmdResult {
    let config = ctx.load_config()?;
    let client = ctx.client(&config)?;
    let query = TaskQuery::from(args);
    let response = run_query(&client, &query, config.default_timezone()?).await?;
    print_json(&response)
}
