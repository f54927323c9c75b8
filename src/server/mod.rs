// src/server/mod.rs

use crate::config::Config;
use anyhow::Result;

mod connection_loop;
mod context;
mod initialization;
mod metrics_server;
mod routes;
mod spawner;
mod triggers;

pub use context::ServerContext;
pub use routes::build_router;
pub use triggers::{SendManyQuery, SendOneQuery, send_many, send_one};

/// The main server startup function, orchestrating all setup phases.
pub async fn run(config: Config) -> Result<()> {
    // 1. Initialize server state and bind the listener.
    let mut server_context = initialization::setup(config).await?;

    // 2. Spawn all background tasks.
    spawner::spawn_all(&mut server_context).await?;

    // 3. Serve HTTP and WebSocket traffic. This function will run until shutdown.
    connection_loop::run(server_context).await
}
