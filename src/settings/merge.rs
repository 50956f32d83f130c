//! Settings merge logic
//!
//! Merges are one level deep:
//! - Keys: union of both layers, base keys first
//! - Values: overlay wins outright, nested objects are replaced, never merged
//! - Functions and producers: shared, so they keep their identity

use super::value::PartialConfig;

/// Shallow merge of an overlay onto a base layer.
///
/// Keys of `base` come first in their own order, followed by keys that only
/// `overlay` has. The result is a fresh map. Plain values are cloned, which copies nested
/// JSON deeply, so the result shares no mutable data with either input.
pub fn shallow_merge(base: &PartialConfig, overlay: &PartialConfig) -> PartialConfig {
    let mut merged = base.clone();
    for (key, value) in overlay {
        merged.insert(key.clone(), value.clone());
    }
    merged
}
