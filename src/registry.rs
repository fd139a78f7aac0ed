//! Descriptor arena plus the type-identity memo table.
//!
//! Descriptors live in a flat `Vec` and refer to each other by
//! [`DescriptorId`], so self-referential shapes are plain index cycles.
//! The memo table maps a [`TypeId`] to the canonical descriptor and is what
//! breaks recursion: the builder registers an aggregate before it visits any
//! field. A second table keys pointers, sequences and maps by their
//! children's descriptors, so `Option<T>`, `Option<Box<T>>` and `&T` (or
//! `Vec<T>` and `VecDeque<T>`) all resolve to one descriptor.
//!
//! Nothing is ever evicted. A registry grows with the number of distinct
//! types it has seen.

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;

use serde::Deserialize;

use crate::descriptor::Descriptor;
use crate::shape::ScalarKind;
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DescriptorId(u32);

impl DescriptorId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for DescriptorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Pointer,
    Sequence,
    Map,
    Aggregate,
    Scalar,
    Opaque,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pointer => "pointer",
            Self::Sequence => "sequence",
            Self::Map => "map",
            Self::Aggregate => "aggregate",
            Self::Scalar => "scalar",
            Self::Opaque => "opaque",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Layout {
    /// Registered, children not built yet.
    Pending,
    Pointer { target: DescriptorId },
    Sequence { element: DescriptorId },
    Map { key: DescriptorId, value: DescriptorId },
    Aggregate { fields: Vec<FieldDescriptor> },
    Scalar(ScalarKind),
    Opaque,
}

impl Layout {
    pub fn kind(&self) -> Kind {
        match self {
            Self::Pointer { .. } => Kind::Pointer,
            Self::Sequence { .. } => Kind::Sequence,
            Self::Map { .. } => Kind::Map,
            Self::Aggregate { .. } => Kind::Aggregate,
            Self::Scalar(_) => Kind::Scalar,
            Self::Pending | Self::Opaque => Kind::Opaque,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

/// Structural identity of a container: its category plus its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum ShapeKey {
    Pointer(DescriptorId),
    Sequence(DescriptorId),
    Map(DescriptorId, DescriptorId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    pub name: String,
    pub tag: String,
    pub embedded: bool,
    pub descriptor: DescriptorId,
}

#[derive(Debug, Clone)]
pub struct TypeDescriptor {
    pub name: String,
    pub layout: Layout,
    pub rust_type: &'static str,
    /// Set once, on the root of a build call.
    pub all_descriptors: Vec<DescriptorId>,
    pub zero: Option<Value>,
    pub resolved: bool,
}

impl TypeDescriptor {
    pub(crate) fn pending(rust_type: &'static str, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            layout: Layout::Pending,
            rust_type,
            all_descriptors: Vec::new(),
            zero: None,
            resolved: false,
        }
    }

    pub fn kind(&self) -> Kind {
        self.layout.kind()
    }
}

// ------------------------------- Config ----------------------------------- //

/// What an aggregate descriptor's zero instance is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AggregateZero {
    /// A record of the aggregate's own fields whose zeros resolved.
    #[default]
    OwnShape,
    /// Every aggregate reports the zero of the outermost input type of the
    /// build that resolved it. Aggregates then do not describe themselves;
    /// kept for output compatibility with older dumps.
    OutermostRoot,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RegistryConfig {
    pub aggregate_zero: AggregateZero,
}

// ------------------------------ Registry ---------------------------------- //

#[derive(Debug)]
pub struct Registry {
    pub(crate) config: RegistryConfig,
    pub(crate) nodes: Vec<TypeDescriptor>,
    pub(crate) by_type: HashMap<TypeId, DescriptorId>,
    pub(crate) by_shape: HashMap<ShapeKey, DescriptorId>,
    /// Shared stub for untyped and opaque shapes. Never registered by type.
    pub(crate) any: DescriptorId,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    pub fn with_config(config: RegistryConfig) -> Self {
        let mut any = TypeDescriptor::pending("any", "any");
        any.layout = Layout::Opaque;
        Self {
            config,
            nodes: vec![any],
            by_type: HashMap::new(),
            by_shape: HashMap::new(),
            any: DescriptorId(0),
        }
    }

    pub fn config(&self) -> RegistryConfig {
        self.config
    }

    pub fn lookup(&self, type_id: TypeId) -> Option<DescriptorId> {
        self.by_type.get(&type_id).copied()
    }

    /// Inserts or overwrites.
    pub fn register(&mut self, type_id: TypeId, id: DescriptorId) {
        self.by_type.insert(type_id, id);
    }

    pub fn descriptor(&self, id: DescriptorId) -> Option<Descriptor<'_>> {
        (id.index() < self.nodes.len()).then(|| Descriptor::new(self, id))
    }

    /// The opaque `any` stub.
    pub fn any(&self) -> Descriptor<'_> {
        Descriptor::new(self, self.any)
    }

    /// Number of descriptors, the `any` stub included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    pub(crate) fn node(&self, id: DescriptorId) -> &TypeDescriptor {
        &self.nodes[id.index()]
    }

    pub(crate) fn node_mut(&mut self, id: DescriptorId) -> &mut TypeDescriptor {
        &mut self.nodes[id.index()]
    }

    pub(crate) fn alloc(&mut self, node: TypeDescriptor) -> DescriptorId {
        let id = DescriptorId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Drops every descriptor created at or after `mark` and any memo entry
    /// that points at one.
    pub(crate) fn rollback(&mut self, mark: usize) {
        self.nodes.truncate(mark);
        self.by_type.retain(|_, id| id.index() < mark);
        self.by_shape.retain(|_, id| id.index() < mark);
    }
}
