//! Zero instance synthesis.
//!
//! One pass over the descriptors a build visited, in completion order, so a
//! child is normally settled before its parent. Prerequisites that are still
//! unresolved (cycles, opaque children) leave the parent unresolved, except
//! for aggregates which drop such fields from their record.

use std::collections::HashSet;

use indexmap::IndexMap;
use tracing::trace;

use crate::registry::{AggregateZero, DescriptorId, Layout, Registry};
use crate::value::Value;

impl Registry {
    pub(crate) fn synthesize(&mut self, root: DescriptorId, order: &[DescriptorId]) {
        let mut aggregates = Vec::new();

        for &id in order {
            if self.node(id).resolved {
                continue;
            }
            let zero = match &self.node(id).layout {
                Layout::Pending | Layout::Opaque => None,
                Layout::Scalar(kind) => Some(kind.zero()),
                Layout::Pointer { target } => self.zero_of(*target).map(|_| Value::Null {
                    pointee: self.node(*target).name.clone(),
                }),
                Layout::Sequence { element } => self.zero_of(*element).map(|_| Value::Sequence {
                    element: self.node(*element).name.clone(),
                    items: Vec::new(),
                }),
                Layout::Map { key, value } => match (self.zero_of(*key), self.zero_of(*value)) {
                    (Some(_), Some(_)) => Some(Value::Map {
                        key: self.node(*key).name.clone(),
                        value: self.node(*value).name.clone(),
                        entries: Vec::new(),
                    }),
                    _ => None,
                },
                Layout::Aggregate { fields } => {
                    let mut record = IndexMap::with_capacity(fields.len());
                    for field in fields {
                        if let Some(zero) = self.zero_of(field.descriptor) {
                            record.insert(field.name.clone(), zero.clone());
                        }
                    }
                    aggregates.push(id);
                    Some(Value::Record { name: self.node(id).name.clone(), fields: record })
                }
            };

            match zero {
                Some(zero) => {
                    let node = self.node_mut(id);
                    node.zero = Some(zero);
                    node.resolved = true;
                }
                None => trace!(id = %id, descriptor = %self.node(id).name, "zero unresolved"),
            }
        }

        if self.config.aggregate_zero == AggregateZero::OutermostRoot && !aggregates.is_empty() {
            let root_zero = self.intrinsic_zero(root, &mut HashSet::new());
            for id in aggregates {
                self.node_mut(id).zero = root_zero.clone();
            }
        }
    }

    fn zero_of(&self, id: DescriptorId) -> Option<&Value> {
        let node = self.node(id);
        if node.resolved { node.zero.as_ref() } else { None }
    }

    /// Zero of a descriptor's own type, independent of any synthesis state.
    /// Pointers are always null, so only by-value aggregate nesting recurses.
    fn intrinsic_zero(&self, id: DescriptorId, stack: &mut HashSet<DescriptorId>) -> Option<Value> {
        let node = self.node(id);
        match &node.layout {
            Layout::Pending | Layout::Opaque => None,
            Layout::Scalar(kind) => Some(kind.zero()),
            Layout::Pointer { target } => Some(Value::Null {
                pointee: self.node(*target).name.clone(),
            }),
            Layout::Sequence { element } => Some(Value::Sequence {
                element: self.node(*element).name.clone(),
                items: Vec::new(),
            }),
            Layout::Map { key, value } => Some(Value::Map {
                key: self.node(*key).name.clone(),
                value: self.node(*value).name.clone(),
                entries: Vec::new(),
            }),
            Layout::Aggregate { fields } => {
                if !stack.insert(id) {
                    return None;
                }
                let mut record = IndexMap::with_capacity(fields.len());
                for field in fields {
                    if let Some(zero) = self.intrinsic_zero(field.descriptor, stack) {
                        record.insert(field.name.clone(), zero);
                    }
                }
                stack.remove(&id);
                Some(Value::Record { name: node.name.clone(), fields: record })
            }
        }
    }
}
