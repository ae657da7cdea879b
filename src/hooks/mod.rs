//! Output hooks
//!
//! A hook is told about every track change. Hooks are configured in order
//! under `[[hooks]]` and notified in that order; one failing hook never stops
//! the others from running.

mod file_dump;
mod geek_magic;
mod http_server;
mod mqtt;

pub use file_dump::FileDumpHook;
pub use geek_magic::GeekMagicHook;
pub use http_server::HttpServerHook;
pub use mqtt::MqttHook;

use async_trait::async_trait;
use futures::future::join_all;
use tracing::{debug, error, info};

use crate::config::{HookConfig, Settings};
use crate::error::Result;
use crate::track::Track;

/// Something that reacts to track changes.
///
/// `setup` runs once before the first poll and `teardown` once after the
/// last. Both default to doing nothing.
#[async_trait]
pub trait Hook: Send + Sync {
    /// Short name used in logs and errors
    fn name(&self) -> &'static str;

    async fn setup(&mut self) -> Result<()> {
        Ok(())
    }

    async fn on_track_change(&mut self, track: &Track) -> Result<()>;

    async fn teardown(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Build the hook described by `config`.
///
/// # Errors
///
/// Fails when the hook's own configuration is unusable, e.g. a missing
/// required field.
pub fn build_hook(config: &HookConfig, settings: &Settings) -> Result<Box<dyn Hook>> {
    let hook: Box<dyn Hook> = match config {
        HookConfig::FileDump(config) => Box::new(FileDumpHook::new(
            config.clone(),
            settings.show_inactive_tracks,
        )),
        HookConfig::HttpServer(config) => Box::new(HttpServerHook::new(config.clone())),
        HookConfig::Mqtt(config) => Box::new(MqttHook::new(config.clone())?),
        HookConfig::GeekMagic(config) => Box::new(GeekMagicHook::new(config.clone())?),
    };
    Ok(hook)
}

/// Ordered set of hooks with the lifecycle the poller drives.
pub struct HookDispatcher {
    hooks: Vec<Box<dyn Hook>>,
    torn_down: bool,
}

impl HookDispatcher {
    #[must_use]
    pub fn new(hooks: Vec<Box<dyn Hook>>) -> Self {
        Self {
            hooks,
            torn_down: false,
        }
    }

    /// Construct every configured hook, failing on the first one that cannot
    /// be built.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let hooks = settings
            .hooks
            .iter()
            .map(|config| build_hook(config, settings))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(hooks))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Set up all hooks concurrently. Failures are logged; the hook stays
    /// registered.
    pub async fn setup_all(&mut self) {
        let results = join_all(
            self.hooks
                .iter_mut()
                .map(|hook| async move { (hook.name(), hook.setup().await) }),
        )
        .await;

        for (name, result) in results {
            match result {
                Ok(()) => debug!(hook = name, "Hook set up"),
                Err(e) => error!(hook = name, error = %e, "Hook setup failed"),
            }
        }
    }

    /// Notify every hook in order, waiting for each one before the next.
    pub async fn notify_all(&mut self, track: &Track) {
        for hook in &mut self.hooks {
            if let Err(e) = hook.on_track_change(track).await {
                error!(hook = hook.name(), error = %e, "Hook failed to handle track change");
            }
        }
    }

    /// Tear down all hooks concurrently. Only the first call does anything.
    pub async fn teardown_all(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;

        let results = join_all(
            self.hooks
                .iter_mut()
                .map(|hook| async move { (hook.name(), hook.teardown().await) }),
        )
        .await;

        for (name, result) in results {
            if let Err(e) = result {
                error!(hook = name, error = %e, "Hook teardown failed");
            }
        }
        info!(hooks = self.hooks.len(), "Hooks torn down");
    }
}
