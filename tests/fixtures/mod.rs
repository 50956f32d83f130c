//! Shared fixtures for settings resolution tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use envmerge::{ConfigMap, ConfigResolver, Deferred, PartialConfig, Setting};
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;

/// Install a test subscriber once; honours `RUST_LOG`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// Defaults plus one shallow and one nested override.
pub fn layered_resolver() -> ConfigResolver {
    ConfigResolver::new(
        ConfigMap::from_value(json!({
            "common": {
                "hello": "world",
                "nested": {"key": "value"}
            },
            "shallow-override": {"hello": "moon"},
            "deep-override": {"nested": {"hai": "there"}}
        }))
        .unwrap(),
    )
}

/// Partial config from a JSON object.
pub fn partial(value: Value) -> PartialConfig {
    serde_json::from_value(value).unwrap()
}

/// Sync producer that counts its invocations.
pub fn counted(value: Value) -> (Setting, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let producer = Deferred::sync(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        value.clone()
    });
    (Setting::Deferred(producer), calls)
}

pub fn calls(counter: &AtomicUsize) -> usize {
    counter.load(Ordering::SeqCst)
}
