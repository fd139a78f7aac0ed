//! Canonical type descriptor graphs for Rust values.
//!
//! Hand a value to a [`Registry`] and get back the descriptor of its type's
//! structural shape: pointers, sequences, maps, aggregates with named fields,
//! scalars. Identical types share one descriptor, self-referential types
//! build in bounded time, and every descriptor carries a synthesized zero
//! instance ([`Value`]) where one can be derived.
//!
//! ```
//! use structmeta::{introspect_struct, Kind, Registry};
//!
//! #[derive(Default)]
//! struct Node { next: Option<Box<Node>>, label: String }
//!
//! introspect_struct! {
//!     Node {
//!         next: Option<Box<Node>>,
//!         label: String = "json:\"label\"",
//!     }
//! }
//!
//! let mut registry = Registry::new();
//! let node = registry.describe(&Node::default()).unwrap();
//! assert_eq!(node.kind(), Kind::Aggregate);
//! assert_eq!(node.field("next").unwrap().descriptor().name(), "*Node");
//! assert!(node.debug_format().contains("// recursion"));
//! ```
pub mod builder;
pub mod cli;
pub mod descriptor;
pub mod error;
pub mod format;
pub mod registry;
pub mod sample;
pub mod shape;
pub mod value;
pub mod zero;

use std::sync::{Mutex, PoisonError};

use once_cell::sync::Lazy;

pub use descriptor::{Descriptor, Field};
pub use error::IntrospectError;
pub use registry::{
    AggregateZero, DescriptorId, FieldDescriptor, Kind, Layout, Registry, RegistryConfig,
    TypeDescriptor,
};
pub use shape::{FieldShape, Introspect, ScalarKind, Shape, ShapeFn, TypeShape};
pub use value::Value;

// ------------------------------ Global API -------------------------------- //

static GLOBAL: Lazy<Mutex<Registry>> = Lazy::new(|| Mutex::new(Registry::new()));

/// Runs `f` against the process-wide registry.
///
/// The registry is behind a mutex, so concurrent callers serialize instead of
/// racing on the memo table. Prefer an owned [`Registry`] when the cache
/// should not outlive the caller.
///
/// The mutex is not reentrant: calling [`with_global`] or [`introspect`]
/// from inside `f` deadlocks. Use the `&mut Registry` handed to `f` instead.
pub fn with_global<R>(f: impl FnOnce(&mut Registry) -> R) -> R {
    let mut registry = GLOBAL.lock().unwrap_or_else(PoisonError::into_inner);
    f(&mut registry)
}

/// [`Registry::introspect`] on the process-wide registry.
pub fn introspect<T: Introspect>(value: &T) -> Result<DescriptorId, IntrospectError> {
    with_global(|registry| registry.introspect(value))
}
