//! Environment-layered settings
//!
//! Implements the per-environment resolution:
//! 1. Shared defaults (`"common"`)
//! 2. Environment overrides, replacing defaults key by key
//! 3. Deferred producers, invoked on the private copy

mod deferred;
mod fanout;
mod merge;
mod resolved;
mod resolver;
mod sync_pass;
mod value;

pub use deferred::{mark_deferred, Completion, Deferred, DeferredKind, ProducerResult};
pub use fanout::resolve_deferred_with;
pub use merge::shallow_merge;
pub use resolved::ResolvedConfig;
pub use resolver::{ConfigResolver, PendingResolution};
pub use sync_pass::resolve_deferred;
pub use value::{Callable, ConfigMap, PartialConfig, Setting, COMMON_ENV, ENV_KEY};
