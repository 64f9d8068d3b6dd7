//! Activation Server - binds license keys to devices or nicknames
//!
//! Architecture:
//! - SeaORM (SQLite/Postgres) or a single JSON document for persistence
//! - Axum for the client API and the password-gated admin console
//! - Tokio for async runtime, plugins supervised and restarted on crash

mod entity;
mod error;
mod model;
mod plugins;
mod policy;
mod prelude;
mod state;
mod store;
mod sv;

use std::env;

use tracing_subscriber::{
  EnvFilter, layer::SubscriberExt, util::SubscriberInitExt,
};

use crate::{
  plugins::App,
  prelude::*,
  state::{AppState, Config},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  dotenvy::dotenv().ok();

  tracing_subscriber::registry()
    .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
      "activation=debug,tower_http=debug,sea_orm=warn".into()
    }))
    .with(tracing_subscriber::fmt::layer())
    .init();

  let secret = env::var("ADMIN_SECRET").context("ADMIN_SECRET not set")?;
  if secret.is_empty() {
    anyhow::bail!("ADMIN_SECRET must not be empty");
  }
  let config = Config::from_env()?;

  info!("Starting Activation Server v{}", env!("CARGO_PKG_VERSION"));
  info!("Identity mode: {}", config.policy);

  let app = Arc::new(
    AppState::new(secret, config).await.context("Failed to open store")?,
  );

  let handles = App::new()
    .backoff(app.config.restart_delay)
    .register(plugins::server::Plugin)
    .run(app);

  tokio::signal::ctrl_c().await.context("Failed to listen for ctrl-c")?;
  info!("Shutting down");
  for handle in handles {
    handle.abort();
  }

  Ok(())
}
