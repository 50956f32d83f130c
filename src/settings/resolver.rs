//! Settings resolver
//!
//! Builds the settings for one environment on every request:
//! 1. Shared defaults from `"common"`
//! 2. The environment's overrides, one level deep
//! 3. `ENV` set to the environment name
//! 4. Deferred producers replaced by their values
//!
//! The config map is only read. Each request works on its own copy.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::channel::oneshot;
use tracing::debug;

use super::fanout::resolve_deferred_with;
use super::merge::shallow_merge;
use super::resolved::{tag_environment, ResolvedConfig};
use super::sync_pass::resolve_deferred;
use super::value::{ConfigMap, PartialConfig};
use crate::error::{Result, SettingsError};

/// Resolves environment settings from a [`ConfigMap`].
#[derive(Clone, Debug, Default)]
pub struct ConfigResolver {
    configs: ConfigMap,
}

impl ConfigResolver {
    pub fn new(configs: ConfigMap) -> Self {
        Self { configs }
    }

    pub fn config_map(&self) -> &ConfigMap {
        &self.configs
    }

    pub fn has_environment(&self, env: &str) -> bool {
        self.configs.contains(env)
    }

    /// Resolve settings synchronously.
    ///
    /// Callback producers are invoked with a completion nobody waits on and
    /// their settings come back as `null`; use [`ConfigResolver::resolve_with`]
    /// or [`ConfigResolver::resolve_async`] for those.
    ///
    /// The slot is overwritten with `null` rather than left holding the
    /// producer. A resolved map never carries a producer, so it still
    /// converts with [`ResolvedConfig::to_value`], and resolving it again
    /// cannot invoke the producer a second time. The key stays present so the
    /// caller can see the setting was not loaded.
    pub fn resolve(&self, env: &str) -> Result<ResolvedConfig> {
        let mut settings = self.prepare(env)?;
        resolve_deferred(&mut settings);
        Ok(ResolvedConfig::new(env.to_string(), settings))
    }

    /// Resolve settings, reporting the outcome to `on_complete`.
    ///
    /// A missing environment is returned right away and `on_complete` is never
    /// called. Otherwise `on_complete` is called exactly once: with the
    /// settings after every producer has completed, or with the first
    /// producer error. It may run before this call returns if every producer
    /// completes inline.
    pub fn resolve_with<F>(&self, env: &str, on_complete: F) -> Result<()>
    where
        F: FnOnce(Result<ResolvedConfig>) + Send + 'static,
    {
        let settings = self.prepare(env)?;
        let env = env.to_string();
        resolve_deferred_with(settings, move |result| {
            on_complete(result.map(|settings| ResolvedConfig::new(env, settings)))
        });
        Ok(())
    }

    /// Resolve settings as a future.
    ///
    /// Producers are dispatched before this returns; the future only waits
    /// for their completions.
    pub fn resolve_async(&self, env: &str) -> Result<PendingResolution> {
        let (tx, rx) = oneshot::channel();
        self.resolve_with(env, move |result| {
            // The receiver may be gone if the caller stopped waiting
            let _ = tx.send(result);
        })?;
        Ok(PendingResolution { rx })
    }

    /// Merge defaults and overrides into a private copy tagged with `ENV`.
    fn prepare(&self, env: &str) -> Result<PartialConfig> {
        let overrides = self
            .configs
            .get(env)
            .ok_or_else(|| SettingsError::MissingEnvironment(env.to_string()))?;

        let empty = PartialConfig::new();
        let common = self.configs.common().unwrap_or(&empty);
        let mut settings = shallow_merge(common, overrides);
        tag_environment(&mut settings, env);

        debug!(env = %env, keys = settings.len(), "merged settings");
        Ok(settings)
    }
}

/// Future returned by [`ConfigResolver::resolve_async`].
#[derive(Debug)]
#[must_use = "futures do nothing unless polled"]
pub struct PendingResolution {
    rx: oneshot::Receiver<Result<ResolvedConfig>>,
}

impl Future for PendingResolution {
    type Output = Result<ResolvedConfig>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(SettingsError::Interrupted)))
    }
}
