//! Deferred producers
//!
//! A deferred producer is a function tagged for invocation during
//! resolution. The tag carries its kind explicitly:
//! - `Sync`: called with no arguments, the return value is the setting
//! - `Callback`: called with a [`Completion`] that must be completed once
//!   with either a value or an error, possibly much later

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::{trace, warn};

use super::value::Callable;
use crate::error::{ProducerError, Result, SettingsError};

/// What a callback producer reports through its completion.
pub type ProducerResult = std::result::Result<Value, ProducerError>;

type CallbackProducer = dyn Fn(Completion) + Send + Sync;
type Notify = Box<dyn FnOnce(Result<Value>) + Send>;

/// How a deferred producer delivers its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferredKind {
    Sync,
    Callback,
}

#[derive(Clone)]
pub(crate) enum Producer {
    Sync(Callable),
    Callback(Arc<CallbackProducer>),
}

/// A producer tagged for invocation during resolution.
///
/// Cloning shares the producer; clones compare equal under [`Deferred::ptr_eq`].
#[derive(Clone)]
pub struct Deferred {
    pub(crate) producer: Producer,
}

/// Tag a function as a deferred producer.
///
/// The returned producer shares the function with `callable`, so anything
/// the function captured is the same state in both.
pub fn mark_deferred(callable: Callable) -> Deferred {
    Deferred::from_callable(callable)
}

impl Deferred {
    /// Producer that returns its value immediately.
    pub fn sync<F>(f: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        Self::from_callable(Callable::new(f))
    }

    /// Producer that reports its value through a [`Completion`].
    pub fn with_callback<F>(f: F) -> Self
    where
        F: Fn(Completion) + Send + Sync + 'static,
    {
        Self {
            producer: Producer::Callback(Arc::new(f)),
        }
    }

    pub(crate) fn from_callable(callable: Callable) -> Self {
        Self {
            producer: Producer::Sync(callable),
        }
    }

    pub fn kind(&self) -> DeferredKind {
        match self.producer {
            Producer::Sync(_) => DeferredKind::Sync,
            Producer::Callback(_) => DeferredKind::Callback,
        }
    }

    /// The tagged function, for `Sync` producers.
    pub fn as_callable(&self) -> Option<&Callable> {
        match &self.producer {
            Producer::Sync(callable) => Some(callable),
            Producer::Callback(_) => None,
        }
    }

    pub fn ptr_eq(&self, other: &Deferred) -> bool {
        match (&self.producer, &other.producer) {
            (Producer::Sync(a), Producer::Sync(b)) => a.ptr_eq(b),
            (Producer::Callback(a), Producer::Callback(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Deferred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.producer {
            Producer::Sync(callable) => write!(f, "Deferred::Sync({:?})", callable),
            Producer::Callback(producer) => {
                write!(f, "Deferred::Callback({:p})", Arc::as_ptr(producer))
            }
        }
    }
}

/// One-shot completion handed to a callback producer.
///
/// Completing consumes the handle, so a producer can report at most once.
/// Dropping it without completing settles the setting as abandoned.
pub struct Completion {
    key: String,
    notify: Option<Notify>,
}

impl Completion {
    pub(crate) fn new(key: String, notify: Notify) -> Self {
        Self {
            key,
            notify: Some(notify),
        }
    }

    /// Completion nobody waits on, used by the synchronous pass.
    pub(crate) fn detached(key: String) -> Self {
        let notify: Notify = Box::new(|outcome: Result<Value>| match outcome {
            Err(SettingsError::Abandoned { key }) => {
                trace!(key = %key, "detached completion dropped");
            }
            Err(err) => {
                warn!(error = %err, "deferred setting failed after synchronous resolution");
            }
            Ok(_) => {
                warn!("deferred setting completed after synchronous resolution; value discarded");
            }
        });
        Self::new(key, notify)
    }

    /// Key of the setting this completion fills.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn complete(mut self, result: ProducerResult) {
        let outcome = result.map_err(|source| SettingsError::Producer {
            key: self.key.clone(),
            source,
        });
        self.settle(outcome);
    }

    pub fn succeed(self, value: impl Into<Value>) {
        self.complete(Ok(value.into()));
    }

    pub fn fail(self, error: impl Into<ProducerError>) {
        self.complete(Err(error.into()));
    }

    fn settle(&mut self, outcome: Result<Value>) {
        if let Some(notify) = self.notify.take() {
            notify(outcome);
        }
    }
}

impl Drop for Completion {
    fn drop(&mut self) {
        if self.notify.is_some() {
            let key = self.key.clone();
            self.settle(Err(SettingsError::Abandoned { key }));
        }
    }
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion")
            .field("key", &self.key)
            .field("settled", &self.notify.is_none())
            .finish()
    }
}
