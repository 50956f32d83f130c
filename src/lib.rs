//! envmerge - environment-layered settings
//!
//! A [`ConfigResolver`] holds partial settings for named environments. Each
//! request merges the requested environment over the `"common"` defaults one
//! level deep, stamps the result with `ENV`, and replaces every deferred
//! producer with the value it produces, either synchronously or through
//! completions that may arrive later.

pub mod error;
pub mod settings;

pub use error::{ProducerError, Result, SettingsError};
pub use settings::{
    mark_deferred, resolve_deferred, resolve_deferred_with, Callable, Completion, ConfigMap,
    ConfigResolver, Deferred, DeferredKind, PartialConfig, PendingResolution, ResolvedConfig,
    Setting, COMMON_ENV, ENV_KEY,
};
