use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod server;

#[derive(Parser)]
#[command(name = "todosched", version, about = "Timetable import and free-slot finder for Todoist")]
struct Cli {
    /// Config file (default: ~/.config/todosched/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP service
    Serve {
        /// Listen address, overrides server.bind
        #[arg(long, value_name = "ADDR")]
        bind: Option<String>,
    },
    /// Import schedule items from a JSON file ("-" reads stdin)
    Import {
        file: PathBuf,
        /// Resolve and validate without writing anything
        #[arg(long)]
        dry_run: bool,
    },
    /// Query tasks by project, label and due date
    Query(commands::query::QueryArgs),
    /// Find free time slots
    FreeSlots(commands::free_slots::FreeSlotsArgs),
    /// Update or delete a single task
    Task {
        #[command(subcommand)]
        action: commands::task::TaskAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing();

    let ctx = commands::Context::new(cli.config);
    let result = match cli.command {
        Commands::Serve { bind } => commands::serve::run(&ctx, bind).await,
        Commands::Import { file, dry_run } => commands::import::run(&ctx, &file, dry_run).await,
        Commands::Query(args) => commands::query::run(&ctx, args).await,
        Commands::FreeSlots(args) => commands::free_slots::run(&ctx, args).await,
        Commands::Task { action } => commands::task::run(&ctx, action).await,
        Commands::Config { action } => commands::config::run(&ctx, action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
