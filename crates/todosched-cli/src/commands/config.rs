use clap::Subcommand;
use todosched_core::Config;

use super::{print_json, CmdResult, Context};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Dot-separated key (e.g. "free_slots.workday_start")
        key: String,
    },
    /// Set a config value
    Set {
        /// Dot-separated key
        key: String,
        /// New value
        value: String,
    },
    /// List all config values
    List,
    /// Reset config to defaults
    Reset,
    /// Print the config file location
    Path,
}

pub fn run(ctx: &Context, action: ConfigAction) -> CmdResult {
    match action {
        ConfigAction::Get { key } => {
            let config = ctx.load_file()?;
            match config.get(&key) {
                Some(value) => println!("{value}"),
                None => return Err(todosched_core::ConfigError::UnknownKey(key).into()),
            }
        }
        ConfigAction::Set { key, value } => {
            let path = ctx.config_path()?;
            let mut config = ctx.load_file()?;
            config.set(&key, &value)?;
            config.save_to(&path)?;
            println!("ok");
        }
        ConfigAction::List => {
            let mut config = ctx.load_file()?;
            if !config.todoist.api_token.is_empty() {
                config.todoist.api_token = "********".into();
            }
            print_json(&config)?;
        }
        ConfigAction::Reset => {
            Config::default().save_to(&ctx.config_path()?)?;
            println!("config reset to defaults");
        }
        ConfigAction::Path => {
            println!("{}", ctx.config_path()?.display());
        }
    }
    Ok(())
}
