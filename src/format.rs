//! Indented, cycle-safe dump of a descriptor graph.
//!
//! ```text
//! pointer	(root): *Thing
//! aggregate	  (ptr value): Thing
//! pointer	    thing: *Thing
//! aggregate	      (ptr value): Thing // recursion
//! scalar	    cheese: f64 json:"cheese"
//! ```
//!
//! The visited set lives for one call only; it has nothing to do with the
//! registry's memo table.

use std::collections::HashSet;
use std::fmt::Write;

use crate::registry::{DescriptorId, Kind, Layout, Registry};

#[derive(Default)]
struct Path {
    depth: usize,
    visited: HashSet<DescriptorId>,
    /// Descriptors on the way from the root to the current one.
    ancestors: Vec<DescriptorId>,
    field: Option<String>,
    tag: String,
}

impl Registry {
    pub(crate) fn debug_format(&self, id: DescriptorId) -> String {
        let mut out = String::new();
        self.format_into(id, &mut Path::default(), &mut out);
        out
    }

    fn format_into(&self, id: DescriptorId, path: &mut Path, out: &mut String) {
        let node = self.node(id);
        let kind = node.kind();
        let indent = "  ".repeat(path.depth);

        let label = match path.field.take() {
            Some(field) => field,
            None if path.depth == 0 => "(root)".to_string(),
            None => "(anon)".to_string(),
        };
        let tag = std::mem::take(&mut path.tag);

        let _ = write!(out, "{kind}\t{indent}{label}: {}", node.name);
        if !tag.is_empty() {
            let _ = write!(out, " {tag}");
        }

        let revisit = path.visited.contains(&id) && kind == Kind::Aggregate;
        if revisit || self.closes_container_cycle(id, &path.ancestors) {
            out.push_str(" // recursion\n");
            return;
        }
        out.push('\n');

        path.visited.insert(id);
        path.ancestors.push(id);

        let mut descend = |child: DescriptorId, field: &str, tag: &str, path: &mut Path| {
            path.depth += 1;
            path.field = Some(field.to_string());
            path.tag = tag.to_string();
            self.format_into(child, path, out);
            path.depth -= 1;
        };

        match &node.layout {
            Layout::Pointer { target } => descend(*target, "(ptr value)", "", path),
            Layout::Sequence { element } => descend(*element, "(slice elem)", "", path),
            Layout::Map { key, value } => {
                descend(*key, "(map key)", "", path);
                descend(*value, "(map elem)", "", path);
            }
            Layout::Aggregate { fields } => {
                for field in fields {
                    descend(field.descriptor, &field.name, &field.tag, path);
                }
            }
            Layout::Scalar(_) | Layout::Opaque | Layout::Pending => {}
        }

        path.ancestors.pop();
    }

    /// `id` is on the current path and no aggregate lies between, so the
    /// aggregate check alone would never stop the descent.
    fn closes_container_cycle(&self, id: DescriptorId, ancestors: &[DescriptorId]) -> bool {
        match ancestors.iter().position(|ancestor| *ancestor == id) {
            Some(start) => ancestors[start..]
                .iter()
                .all(|ancestor| self.node(*ancestor).kind() != Kind::Aggregate),
            None => false,
        }
    }
}
