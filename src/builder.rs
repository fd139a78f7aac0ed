//! Recursive descriptor construction.
//!
//! Every new aggregate descriptor is registered while still
//! [`Layout::Pending`], before any field is built. A field that refers back
//! to an ancestor therefore hits the memo table and gets the in-progress
//! descriptor instead of recursing forever.
//!
//! Pointers, sequences and maps build their children first and are then
//! looked up by structure, so two container types with the same children
//! share one descriptor. Rust only allows recursive types through a named
//! aggregate; a hand-written container shape that contains itself directly
//! gets a placeholder the moment it is re-entered.

use std::any::{Any, TypeId};

use indexmap::IndexSet;
use tracing::{debug, trace, warn};

use crate::error::IntrospectError;
use crate::registry::{DescriptorId, FieldDescriptor, Layout, Registry, ShapeKey, TypeDescriptor};
use crate::shape::{Introspect, Shape, TypeShape};

/// State of one top-level call.
#[derive(Default)]
pub(crate) struct Pass {
    /// Descriptors seen, in completion order.
    visited: IndexSet<DescriptorId>,
    /// Containers whose children are being built, innermost last.
    containers: Vec<Frame>,
}

struct Frame {
    type_id: TypeId,
    placeholder: Option<DescriptorId>,
}

impl Registry {
    /// Builds (or fetches) the descriptor graph for the type of `value`.
    pub fn introspect<T: Introspect>(
        &mut self,
        _value: &T,
    ) -> Result<DescriptorId, IntrospectError> {
        self.introspect_type::<T>()
    }

    /// Same as [`Registry::introspect`] without needing a value.
    pub fn introspect_type<T: Introspect + ?Sized>(
        &mut self,
    ) -> Result<DescriptorId, IntrospectError> {
        self.build_root(T::type_shape())
    }

    /// A type-erased value carries no declared shape; it always maps to the
    /// `any` stub.
    pub fn introspect_erased(&mut self, _value: &dyn Any) -> Result<DescriptorId, IntrospectError> {
        self.build_root(TypeShape::of::<dyn Any>())
    }

    pub fn build_root(&mut self, ty: TypeShape) -> Result<DescriptorId, IntrospectError> {
        let mark = self.nodes.len();
        let mut pass = Pass::default();

        let root = match self.build(&ty, &mut pass) {
            Ok(root) => root,
            Err(error) => {
                self.rollback(mark);
                return Err(error);
            }
        };
        if root == self.any {
            return Ok(root);
        }

        let order: Vec<DescriptorId> = pass.visited.into_iter().collect();
        let node = self.node_mut(root);
        if node.all_descriptors.is_empty() {
            node.all_descriptors = order.clone();
        }
        debug!(
            root = %root,
            root_name = %self.node(root).name,
            visited = order.len(),
            created = self.nodes.len() - mark,
            "introspected"
        );

        self.synthesize(root, &order);
        Ok(root)
    }

    fn build(&mut self, ty: &TypeShape, pass: &mut Pass) -> Result<DescriptorId, IntrospectError> {
        if let Some(id) = self.lookup(ty.id) {
            trace!(id = %id, rust_type = ty.rust_type, "memo hit");
            // In-progress ancestors are recorded when they complete.
            if id != self.any && !self.node(id).layout.is_pending() {
                pass.visited.insert(id);
            }
            return Ok(id);
        }

        let id = match &ty.shape {
            Shape::Untyped | Shape::Opaque => return Ok(self.any),

            Shape::Enum { name, .. } => {
                warn!(enum_name = *name, rust_type = ty.rust_type, "enum shapes are not supported");
                return Err(IntrospectError::UnsupportedKind {
                    kind: ty.shape.category(),
                    type_name: ty.rust_type,
                });
            }

            Shape::Scalar(kind) => {
                let mut node = TypeDescriptor::pending(ty.rust_type, kind.name());
                node.layout = Layout::Scalar(*kind);
                node.zero = Some(kind.zero());
                node.resolved = true;
                let id = self.alloc(node);
                self.register(ty.id, id);
                id
            }

            Shape::Pointer(_) | Shape::Sequence(_) | Shape::Map { .. } => {
                let reentered = pass.containers.iter_mut().find(|frame| frame.type_id == ty.id);
                if let Some(frame) = reentered {
                    let id = self.alloc(TypeDescriptor::pending(ty.rust_type, ty.rust_type));
                    self.register(ty.id, id);
                    frame.placeholder = Some(id);
                    debug!(id = %id, rust_type = ty.rust_type, "container re-entered itself");
                    return Ok(id);
                }
                return self.build_container(ty, pass);
            }

            Shape::Aggregate { name, fields: shapes } => {
                let id = self.begin(ty, name.unwrap_or_default());
                let mut fields = Vec::with_capacity(shapes.len());
                for field in shapes {
                    let field_ty = (field.shape)();
                    let child = self.build(&field_ty, pass)?;
                    // Keyed by the field's own type; may replace an earlier entry.
                    self.register(field_ty.id, child);
                    fields.push(FieldDescriptor {
                        name: field.name.to_string(),
                        tag: field.tag.to_string(),
                        embedded: field.embedded,
                        descriptor: child,
                    });
                }
                let name = match name {
                    Some(name) => name.to_string(),
                    None => anonymous_name(&fields),
                };
                self.finish(id, name, Layout::Aggregate { fields });
                id
            }
        };

        if self.node(id).layout.is_pending() {
            return Err(IntrospectError::InternalInvariant { type_name: ty.rust_type });
        }
        pass.visited.insert(id);
        Ok(id)
    }

    fn build_container(
        &mut self,
        ty: &TypeShape,
        pass: &mut Pass,
    ) -> Result<DescriptorId, IntrospectError> {
        pass.containers.push(Frame { type_id: ty.id, placeholder: None });
        let (key, layout, name) = match &ty.shape {
            Shape::Pointer(target) => {
                let target = self.build(&target(), pass)?;
                let name = format!("*{}", self.node(target).name);
                (ShapeKey::Pointer(target), Layout::Pointer { target }, name)
            }
            Shape::Sequence(element) => {
                let element = self.build(&element(), pass)?;
                let name = format!("[]{}", self.node(element).name);
                (ShapeKey::Sequence(element), Layout::Sequence { element }, name)
            }
            Shape::Map { key, value } => {
                let key = self.build(&key(), pass)?;
                let value = self.build(&value(), pass)?;
                let name = format!("map[{}]{}", self.node(key).name, self.node(value).name);
                (ShapeKey::Map(key, value), Layout::Map { key, value }, name)
            }
            _ => return Err(IntrospectError::InternalInvariant { type_name: ty.rust_type }),
        };
        let placeholder = pass.containers.pop().and_then(|frame| frame.placeholder);

        let id = match (placeholder, self.by_shape.get(&key).copied()) {
            (Some(id), _) => {
                self.finish(id, name, layout);
                id
            }
            (None, Some(existing)) => {
                trace!(id = %existing, rust_type = ty.rust_type, "structural hit");
                existing
            }
            (None, None) => {
                let mut node = TypeDescriptor::pending(ty.rust_type, name);
                node.layout = layout;
                let id = self.alloc(node);
                debug!(
                    id = %id,
                    rust_type = ty.rust_type,
                    category = ty.shape.category(),
                    "new descriptor"
                );
                id
            }
        };
        self.by_shape.entry(key).or_insert(id);
        self.register(ty.id, id);
        self.complete(id, key, pass);
        Ok(id)
    }

    /// Records `id` as completed. A descriptor first seen before one of its
    /// children completed moves to the end, behind that child.
    fn complete(&self, id: DescriptorId, key: ShapeKey, pass: &mut Pass) {
        let Some(position) = pass.visited.get_index_of(&id) else {
            pass.visited.insert(id);
            return;
        };
        let children = match key {
            ShapeKey::Pointer(child) | ShapeKey::Sequence(child) => [child, child],
            ShapeKey::Map(key, value) => [key, value],
        };
        let settled = children.iter().all(|child| {
            *child == self.any
                || pass.visited.get_index_of(child).is_some_and(|index| index < position)
        });
        if !settled {
            pass.visited.shift_remove(&id);
            pass.visited.insert(id);
        }
    }

    fn begin(&mut self, ty: &TypeShape, name: &str) -> DescriptorId {
        let id = self.alloc(TypeDescriptor::pending(ty.rust_type, name));
        self.register(ty.id, id);
        debug!(
            id = %id,
            rust_type = ty.rust_type,
            category = ty.shape.category(),
            "new descriptor"
        );
        id
    }

    fn finish(&mut self, id: DescriptorId, name: String, layout: Layout) {
        let node = self.node_mut(id);
        node.name = name;
        node.layout = layout;
    }
}

fn anonymous_name(fields: &[FieldDescriptor]) -> String {
    let mut name = String::from("struct { ");
    for field in fields {
        name.push_str(&field.name);
        name.push(' ');
    }
    name.push('}');
    name
}
