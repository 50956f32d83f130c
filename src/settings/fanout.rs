//! Asynchronous resolution pass
//!
//! Every deferred producer is dispatched before any of them is waited on.
//! The outcome is reported exactly once:
//! - success, after every callback producer has completed
//! - failure, on the first producer error; producers still in flight are not
//!   cancelled and whatever they report later is dropped

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use tracing::{debug, trace};

use super::deferred::{Completion, Producer};
use super::value::{PartialConfig, Setting};
use crate::error::Result;

type OnComplete = Box<dyn FnOnce(Result<PartialConfig>) + Send>;

/// Fan-in state shared by every completion of one resolution.
struct FanIn {
    state: Mutex<FanInState>,
}

struct FanInState {
    /// Taken when the outcome is reported
    settings: Option<PartialConfig>,
    /// Outstanding callback producers, plus one while dispatch is running
    pending: usize,
    on_complete: Option<OnComplete>,
}

enum Report {
    Done(OnComplete, Result<PartialConfig>),
    Waiting,
}

impl FanIn {
    fn lock(&self) -> MutexGuard<'_, FanInState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record one settled slot. Never runs user code under the lock.
    fn settle(&self, key: Option<String>, outcome: Result<Value>) {
        let report = {
            let mut state = self.lock();
            state.record(key, outcome)
        };
        if let Report::Done(on_complete, result) = report {
            on_complete(result);
        }
    }

    /// Store a value produced inline during dispatch.
    fn store(&self, key: String, value: Value) {
        let mut state = self.lock();
        if let Some(settings) = state.settings.as_mut() {
            settings.insert(key, Setting::Value(value));
        }
    }
}

impl FanInState {
    fn record(&mut self, key: Option<String>, outcome: Result<Value>) -> Report {
        let Some(on_complete) = self.on_complete.take() else {
            debug!(key = ?key, "late completion after resolution was reported; dropped");
            return Report::Waiting;
        };

        match outcome {
            Err(err) => {
                debug!(error = %err, "deferred setting failed");
                self.settings = None;
                Report::Done(on_complete, Err(err))
            }
            Ok(value) => {
                if let (Some(key), Some(settings)) = (key, self.settings.as_mut()) {
                    trace!(key = %key, "deferred setting completed");
                    settings.insert(key, Setting::Value(value));
                }
                self.pending = self.pending.saturating_sub(1);
                if self.pending > 0 {
                    self.on_complete = Some(on_complete);
                    return Report::Waiting;
                }
                let settings = self.settings.take().unwrap_or_default();
                Report::Done(on_complete, Ok(settings))
            }
        }
    }
}

/// Resolve every deferred producer in `settings`, reporting to `on_complete`.
///
/// Producers are dispatched in key order. `on_complete` is called exactly
/// once, possibly before this returns, with the settings after every callback
/// producer has completed or with the first producer error.
pub fn resolve_deferred_with<F>(settings: PartialConfig, on_complete: F)
where
    F: FnOnce(Result<PartialConfig>) + Send + 'static,
{
    let deferred: Vec<(String, Producer)> = settings
        .iter()
        .filter_map(|(key, setting)| match setting {
            Setting::Deferred(deferred) => Some((key.clone(), deferred.producer.clone())),
            _ => None,
        })
        .collect();

    let callbacks = deferred
        .iter()
        .filter(|(_, producer)| matches!(producer, Producer::Callback(_)))
        .count();
    debug!(deferred = deferred.len(), callbacks, "dispatching deferred settings");

    let fan_in = Arc::new(FanIn {
        state: Mutex::new(FanInState {
            settings: Some(settings),
            pending: callbacks + 1,
            on_complete: Some(Box::new(on_complete)),
        }),
    });

    for (key, producer) in deferred {
        match producer {
            Producer::Sync(callable) => {
                trace!(key = %key, "invoking deferred setting");
                let value = callable.call();
                fan_in.store(key, value);
            }
            Producer::Callback(producer) => {
                trace!(key = %key, "dispatching callback producer");
                let sink = Arc::clone(&fan_in);
                let completion = Completion::new(
                    key.clone(),
                    Box::new(move |outcome: Result<Value>| sink.settle(Some(key), outcome)),
                );
                producer(completion);
            }
        }
    }

    // Release the dispatch guard
    fan_in.settle(None, Ok(Value::Null));
}
