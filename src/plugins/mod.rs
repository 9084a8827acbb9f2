pub mod cron;
pub mod server;

use anyhow::Context;
use async_trait::async_trait;

use crate::{prelude::*, state::AppState};

#[async_trait]
pub trait Plugin: Send + Sync {
  fn name(&self) -> &'static str {
    std::any::type_name::<Self>()
  }

  /// Must return once the plugin is running; long-lived work is spawned.
  async fn start(&self, app: Arc<AppState>) -> anyhow::Result<()>;
}

/// Background services started in registration order.
#[derive(Default)]
pub struct App {
  plugins: Vec<Box<dyn Plugin>>,
}

impl App {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn register<P: Plugin + 'static>(mut self, plugin: P) -> Self {
    self.plugins.push(Box::new(plugin));
    self
  }

  /// Starts every plugin and returns their names. The first failure aborts
  /// startup.
  pub async fn run(
    self,
    app: Arc<AppState>,
  ) -> anyhow::Result<Vec<&'static str>> {
    let mut started = Vec::with_capacity(self.plugins.len());

    for plugin in self.plugins {
      let name = plugin.name();
      info!("Starting `{name}`");

      plugin
        .start(app.clone())
        .await
        .with_context(|| format!("plugin `{name}` failed to start"))?;
      started.push(name);
    }

    Ok(started)
  }
}
