pub mod config;
pub mod free_slots;
pub mod import;
pub mod query;
pub mod serve;
pub mod task;

use std::path::{Path, PathBuf};

use serde::Serialize;
use todosched_core::{Config, CoreError, TodoistClient};

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Per-invocation settings shared by every command.
pub struct Context {
    config_path: Option<PathBuf>,
}

impl Context {
    pub fn new(config_path: Option<PathBuf>) -> Self {
        Self { config_path }
    }

    pub fn config_path(&self) -> Result<PathBuf, CoreError> {
        match &self.config_path {
            Some(path) => Ok(path.clone()),
            None => Ok(Config::default_path()?),
        }
    }

    /// Config file contents only, without environment overrides.
    pub fn load_file(&self) -> Result<Config, CoreError> {
        Ok(Config::load_from(&self.config_path()?)?)
    }

    /// Effective config: file, then environment, then validation.
    pub fn load_config(&self) -> Result<Config, CoreError> {
        let config = self.load_file()?.with_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn client(&self, config: &Config) -> Result<TodoistClient, CoreError> {
        TodoistClient::from_config(&config.todoist)
    }
}

pub fn print_json<T: Serialize>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Read a file, or stdin for `-`.
pub fn read_input(path: &Path) -> std::io::Result<String> {
    if path == Path::new("-") {
        std::io::read_to_string(std::io::stdin())
    } else {
        std::fs::read_to_string(path)
    }
}

/// Split `a,b , c` into trimmed, non-empty parts.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
