//! Long-running services supervised by [`App`].

pub mod server;

use std::{sync::Arc, time::Duration};

use tokio::{task::JoinHandle, time::sleep};
use tracing::{error, info, warn};

use crate::state::AppState;

#[async_trait::async_trait]
pub trait Plugin: Send + Sync {
  fn name(&self) -> &'static str {
    std::any::type_name::<Self>()
  }

  async fn start(&self, app: Arc<AppState>) -> anyhow::Result<()>;
}

pub struct App {
  plugins: Vec<Arc<dyn Plugin>>,
  backoff: Duration,
}

impl Default for App {
  fn default() -> Self {
    Self { plugins: Vec::new(), backoff: Duration::from_secs(5) }
  }
}

impl App {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn register<P: Plugin + 'static>(mut self, plugin: P) -> Self {
    self.plugins.push(Arc::new(plugin));
    self
  }

  /// Delay before a stopped plugin is started again.
  pub fn backoff(mut self, backoff: Duration) -> Self {
    self.backoff = backoff;
    self
  }

  /// Spawns one supervisor per plugin. A supervisor restarts its plugin
  /// whenever it returns or panics and exits once the plugin task is
  /// cancelled.
  pub fn run(self, app: Arc<AppState>) -> Vec<JoinHandle<()>> {
    let backoff = self.backoff;

    self
      .plugins
      .into_iter()
      .map(|plugin| {
        let app = app.clone();
        tokio::spawn(supervise(plugin, app, backoff))
      })
      .collect()
  }
}

async fn supervise(
  plugin: Arc<dyn Plugin>,
  app: Arc<AppState>,
  backoff: Duration,
) {
  let name = plugin.name();
  info!("SYSTEM: Service `{name}` initialized");

  loop {
    let app = app.clone();
    let plugin = plugin.clone();

    let handle = tokio::spawn(async move { plugin.start(app).await });

    match handle.await {
      Ok(Ok(())) => warn!("Service `{name}` stopped unexpectedly (Ok)."),
      Ok(Err(err)) => error!("Service `{name}` crashed with error: {err:#}."),
      Err(err) if err.is_cancelled() => {
        info!("Service `{name}` shutdown.");
        break;
      }
      Err(_) => error!("Service `{name}` PANICKED!"),
    }

    sleep(backoff).await;
    info!("SYSTEM: Restarting service `{name}`...");
  }
}
