use std::net::SocketAddr;
use std::sync::Arc;

use todosched_core::ConfigError;

use super::{CmdResult, Context};
use crate::server::{self, AppState};

pub async fn run(ctx: &Context, bind: Option<String>) -> CmdResult {
    let config = ctx.load_config()?;
    let addr: SocketAddr = match bind {
        Some(raw) => raw.parse().map_err(|e: std::net::AddrParseError| {
            ConfigError::InvalidValue {
                key: "--bind".into(),
                message: e.to_string(),
            }
        })?,
        None => config.bind_addr()?,
    };
    let client = ctx.client(&config)?;

    let state = Arc::new(AppState::new(Box::new(client), config)?);
    tracing::info!(%addr, "serving");
    warp::serve(server::routes(state)).run(addr).await;
    Ok(())
}
