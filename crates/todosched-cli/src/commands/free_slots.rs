use chrono::NaiveDate;
use clap::Args;
use todosched_core::{find_free_slots, FreeSlotDefaults, FreeSlotRequest};

use super::{print_json, CmdResult, Context};

#[derive(Args)]
pub struct FreeSlotsArgs {
    /// First day, YYYY-MM-DD
    #[arg(long)]
    from: NaiveDate,
    /// Last day, YYYY-MM-DD (defaults to --from)
    #[arg(long)]
    to: Option<NaiveDate>,
    /// Only count tasks in these projects (repeatable)
    #[arg(long = "project", value_name = "NAME")]
    projects: Vec<String>,
    /// Start of the workday, HH:MM
    #[arg(long)]
    workday_start: Option<String>,
    /// End of the workday, HH:MM
    #[arg(long)]
    workday_end: Option<String>,
    /// Drop slots shorter than this many minutes
    #[arg(long = "min-slot", value_name = "MINUTES")]
    min_slot: Option<i64>,
    #[arg(long)]
    timezone: Option<String>,
}

impl From<FreeSlotsArgs> for FreeSlotRequest {
    fn from(args: FreeSlotsArgs) -> Self {
        FreeSlotRequest {
            project_names: args.projects,
            date_from: Some(args.from),
            date_to: args.to,
            workday_start: args.workday_start,
            workday_end: args.workday_end,
            min_slot_minutes: args.min_slot,
            timezone: args.timezone,
        }
    }
}

pub async fn run(ctx: &Context, args: FreeSlotsArgs) -> CmdResult {
    let config = ctx.load_config()?;
    let defaults = FreeSlotDefaults::from_config(&config)?;
    let client = ctx.client(&config)?;
    let request = FreeSlotRequest::from(args);
    let response = find_free_slots(&client, &request, &defaults).await?;
    print_json(&response)
}
