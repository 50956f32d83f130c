//! Synchronous resolution pass

use serde_json::Value;
use tracing::{trace, warn};

use super::deferred::{Completion, Producer};
use super::value::{PartialConfig, Setting};

/// Replace every deferred producer in `settings` with its value, in key order.
///
/// Works on any settings map, not only one built by a resolver. `Sync`
/// producers are called and their return value stored. `Callback` producers
/// are still called, but with a detached completion: nothing waits for them
/// and their slot becomes `null`. Mixing callback producers with synchronous
/// resolution is a caller error.
pub fn resolve_deferred(settings: &mut PartialConfig) {
    for (key, setting) in settings.iter_mut() {
        let Setting::Deferred(deferred) = setting else {
            continue;
        };

        let value = match &deferred.producer {
            Producer::Sync(callable) => {
                trace!(key = %key, "invoking deferred setting");
                callable.call()
            }
            Producer::Callback(producer) => {
                warn!(
                    key = %key,
                    "callback producer used with synchronous resolution; setting left null"
                );
                producer(Completion::detached(key.clone()));
                Value::Null
            }
        };
        *setting = Setting::Value(value);
    }
}
