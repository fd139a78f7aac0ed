//! Borrowed views over registry descriptors.

use std::fmt;

use crate::registry::{DescriptorId, FieldDescriptor, Kind, Layout, Registry, TypeDescriptor};
use crate::value::Value;

/// A descriptor together with the registry that owns it.
///
/// Two views are equal only when they name the same descriptor of the same
/// registry, i.e. equality is identity, never structure.
#[derive(Clone, Copy)]
pub struct Descriptor<'r> {
    registry: &'r Registry,
    id: DescriptorId,
}

impl<'r> Descriptor<'r> {
    pub(crate) fn new(registry: &'r Registry, id: DescriptorId) -> Self {
        Self { registry, id }
    }

    fn node(&self) -> &'r TypeDescriptor {
        self.registry.node(self.id)
    }

    fn view(&self, id: DescriptorId) -> Descriptor<'r> {
        Descriptor::new(self.registry, id)
    }

    pub fn id(&self) -> DescriptorId {
        self.id
    }

    pub fn name(&self) -> &'r str {
        &self.node().name
    }

    pub fn kind(&self) -> Kind {
        self.node().kind()
    }

    pub fn layout(&self) -> &'r Layout {
        &self.node().layout
    }

    /// `std::any::type_name` of the Rust type this descriptor was built from.
    pub fn rust_type(&self) -> &'static str {
        self.node().rust_type
    }

    /// The synthesized zero instance, `None` while unresolved.
    pub fn zero(&self) -> Option<&'r Value> {
        self.node().zero.as_ref()
    }

    pub fn is_resolved(&self) -> bool {
        self.node().resolved
    }

    pub fn pointer_target(&self) -> Option<Descriptor<'r>> {
        match self.layout() {
            Layout::Pointer { target } => Some(self.view(*target)),
            _ => None,
        }
    }

    pub fn sequence_element(&self) -> Option<Descriptor<'r>> {
        match self.layout() {
            Layout::Sequence { element } => Some(self.view(*element)),
            _ => None,
        }
    }

    pub fn map_key(&self) -> Option<Descriptor<'r>> {
        match self.layout() {
            Layout::Map { key, .. } => Some(self.view(*key)),
            _ => None,
        }
    }

    pub fn map_value(&self) -> Option<Descriptor<'r>> {
        match self.layout() {
            Layout::Map { value, .. } => Some(self.view(*value)),
            _ => None,
        }
    }

    /// Fields in declaration order; empty for anything but aggregates.
    pub fn fields(&self) -> impl Iterator<Item = Field<'r>> + use<'r> {
        let registry = self.registry;
        let fields: &'r [FieldDescriptor] = match self.layout() {
            Layout::Aggregate { fields } => fields,
            _ => &[],
        };
        fields.iter().map(move |field| Field { registry, field })
    }

    pub fn field(&self, name: &str) -> Option<Field<'r>> {
        self.fields().find(|field| field.name() == name)
    }

    /// Everything visited by the build this descriptor was the root of.
    pub fn all_descriptors(&self) -> impl Iterator<Item = Descriptor<'r>> + use<'r> {
        let registry = self.registry;
        self.node()
            .all_descriptors
            .iter()
            .map(move |id| Descriptor::new(registry, *id))
    }

    pub fn debug_format(&self) -> String {
        self.registry.debug_format(self.id)
    }
}

impl PartialEq for Descriptor<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.registry, other.registry) && self.id == other.id
    }
}

impl Eq for Descriptor<'_> {}

impl fmt::Debug for Descriptor<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Descriptor")
            .field("id", &self.id)
            .field("name", &self.name())
            .field("kind", &self.kind())
            .finish()
    }
}

/// One field of an aggregate descriptor.
#[derive(Clone, Copy)]
pub struct Field<'r> {
    registry: &'r Registry,
    field: &'r FieldDescriptor,
}

impl<'r> Field<'r> {
    pub fn name(&self) -> &'r str {
        &self.field.name
    }

    pub fn tag(&self) -> &'r str {
        &self.field.tag
    }

    pub fn is_embedded(&self) -> bool {
        self.field.embedded
    }

    pub fn descriptor(&self) -> Descriptor<'r> {
        Descriptor::new(self.registry, self.field.descriptor)
    }

    /// Shorthand for the field type's zero instance.
    pub fn zero(&self) -> Option<&'r Value> {
        self.descriptor().zero()
    }
}

impl fmt::Debug for Field<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name())
            .field("tag", &self.tag())
            .field("embedded", &self.is_embedded())
            .field("descriptor", &self.descriptor())
            .finish()
    }
}

impl Registry {
    /// [`Registry::introspect`] returning a view instead of an id.
    pub fn describe<T: crate::Introspect>(
        &mut self,
        value: &T,
    ) -> Result<Descriptor<'_>, crate::IntrospectError> {
        let id = self.introspect(value)?;
        Ok(Descriptor::new(self, id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Pair {
        _left: Option<u8>,
        _right: Vec<String>,
    }

    crate::introspect_struct! {
        Pair {
            #[embedded] _left: Option<u8> = "json:\"left\"",
            _right: Vec<String>,
        }
    }

    #[test]
    fn walks_fields_and_children() {
        let mut registry = Registry::new();
        let pair = registry.describe(&Pair::default()).unwrap();
        assert_eq!(pair.kind(), Kind::Aggregate);

        let left = pair.field("_left").unwrap();
        assert!(left.is_embedded());
        assert_eq!(left.tag(), "json:\"left\"");
        assert_eq!(left.descriptor().pointer_target().unwrap().name(), "u8");

        let right = pair.field("_right").unwrap();
        assert_eq!(right.descriptor().sequence_element().unwrap().name(), "String");
        assert!(pair.field("missing").is_none());
        assert!(pair.pointer_target().is_none());
        assert!(pair.map_key().is_none());
    }

    #[test]
    fn equality_is_identity() {
        let mut registry = Registry::new();
        let a = registry.introspect(&1_u8).unwrap();
        let b = registry.introspect(&(0_u8,)).unwrap();
        let first = registry.descriptor(a).unwrap();
        let nested = registry.descriptor(b).unwrap().fields().next().unwrap().descriptor();
        assert_eq!(first, nested);
    }

    #[test]
    fn views_from_different_registries_differ() {
        let mut first = Registry::new();
        let mut second = Registry::new();
        let a = first.introspect(&1_u8).unwrap();
        let b = second.introspect(&1_u8).unwrap();
        assert_eq!(a, b);
        assert_ne!(first.descriptor(a).unwrap(), second.descriptor(b).unwrap());
    }

    #[test]
    fn scalar_has_no_fields() {
        let mut registry = Registry::new();
        let text = registry.describe(&String::from("hello")).unwrap();
        assert_eq!(text.fields().count(), 0);
        assert_eq!(text.zero(), Some(&Value::String(String::new())));
    }
}
