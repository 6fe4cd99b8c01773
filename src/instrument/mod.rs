//! Function instrumentation
//!
//! Immediate wrappers update their metric on every call; deferred functions
//! go to the [`DeferredSet`], which the snapshot handler
//! evaluates.

pub mod decorator;
pub mod deferred;
pub mod sample;

pub use decorator::Decorator;
pub use deferred::{CollectorFn, CollectorKey, DeferredSet};
pub use sample::IntoSample;
