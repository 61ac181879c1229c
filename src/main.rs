//! Padel club API.
//!
//! - SeaORM over SQLite or MySQL, migrations applied on boot
//! - Axum HTTP API behind rate limiting and JWT auth
//! - Optional in-process video worker that cuts and streams clips

mod auth;
mod entity;
mod error;
mod page;
mod plugins;
mod prelude;
mod state;
mod sv;
mod utils;

use std::sync::Arc;

use tracing_subscriber::{
  EnvFilter, layer::SubscriberExt, util::SubscriberInitExt,
};

use crate::{
  plugins::{App, server, worker},
  prelude::*,
  state::{AppState, Config},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  dotenvy::dotenv().ok();

  tracing_subscriber::registry()
    .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
      "padel=debug,tower_http=debug,sea_orm=warn".into()
    }))
    .with(tracing_subscriber::fmt::layer())
    .init();

  let config = Config::from_env()?;
  info!("Starting Padel API v{}", env!("CARGO_PKG_VERSION"));

  let video_worker = config.video_worker;
  let app = Arc::new(AppState::new(config).await?);

  let mut plugins = App::new().register(server::Plugin);
  if video_worker {
    plugins = plugins.register(worker::Plugin);
  } else {
    info!(
      "Video worker disabled, clips go to {}",
      app.config.video_service_url
    );
  }

  let handles = plugins.run(app.clone());

  tokio::signal::ctrl_c().await.context("Failed to listen for shutdown")?;
  info!("Shutting down...");

  for handle in handles {
    handle.abort();
  }
  app.close().await
}
