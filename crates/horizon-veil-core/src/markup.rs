//! Declarative element trees.
//!
//! [`ElementSpec`] describes a subtree; [`Document::build`] materializes it.
//!
//! ```
//! use horizon_veil_core::{Document, ElementSpec};
//!
//! let mut document = Document::new();
//! let list = document.build(
//!     document.body(),
//!     ElementSpec::new("ul").class("menu").children([
//!         ElementSpec::new("li").id("first"),
//!         ElementSpec::new("li").attr("aria-hidden", "false"),
//!     ]),
//! ).unwrap();
//!
//! assert_eq!(document.children(list).unwrap().len(), 2);
//! ```

use crate::document::{Document, NodeId};
use crate::error::DocumentResult;

/// A description of an element and its descendants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementSpec {
    local_name: String,
    attributes: Vec<(String, String)>,
    children: Vec<ElementSpec>,
}

impl ElementSpec {
    /// Start describing an element with the given tag name.
    pub fn new(local_name: impl Into<String>) -> Self {
        Self {
            local_name: local_name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Set the `id` attribute.
    pub fn id(self, id: impl Into<String>) -> Self {
        self.attr("id", id)
    }

    /// Add a class to the `class` attribute.
    pub fn class(mut self, class: impl Into<String>) -> Self {
        let class = class.into();
        match self.attributes.iter_mut().find(|(n, _)| n == "class") {
            Some((_, existing)) => {
                existing.push(' ');
                existing.push_str(&class);
            }
            None => self.attributes.push(("class".to_string(), class)),
        }
        self
    }

    /// Set an arbitrary attribute.
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = value,
            None => self.attributes.push((name, value)),
        }
        self
    }

    /// Append one child.
    pub fn child(mut self, child: ElementSpec) -> Self {
        self.children.push(child);
        self
    }

    /// Append several children.
    pub fn children(mut self, children: impl IntoIterator<Item = ElementSpec>) -> Self {
        self.children.extend(children);
        self
    }
}

impl Document {
    /// Create the elements described by `spec` and append them under `parent`.
    ///
    /// Returns the ID of the subtree's root element.
    pub fn build(&mut self, parent: NodeId, spec: ElementSpec) -> DocumentResult<NodeId> {
        if !self.contains(parent) {
            return Err(crate::error::DocumentError::InvalidNodeId);
        }
        let id = self.create_subtree(spec)?;
        self.append_child(parent, id)?;
        Ok(id)
    }

    /// Create a detached subtree.
    fn create_subtree(&mut self, spec: ElementSpec) -> DocumentResult<NodeId> {
        let id = self.create_element(&spec.local_name);
        for (name, value) in &spec.attributes {
            self.set_attribute(id, name, value)?;
        }
        for child in spec.children {
            let child_id = self.create_subtree(child)?;
            self.append_child(id, child_id)?;
        }
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_nested_tree() {
        let mut document = Document::new();
        let body = document.body();
        let family = document
            .build(
                body,
                ElementSpec::new("div").id("family").child(
                    ElementSpec::new("div")
                        .id("parent")
                        .children([ElementSpec::new("div").id("target"), ElementSpec::new("div").id("sibling")]),
                ),
            )
            .unwrap();

        let parent = document.element_by_id("parent").unwrap();
        let target = document.element_by_id("target").unwrap();
        assert_eq!(document.parent(parent).unwrap(), Some(family));
        assert_eq!(document.children(parent).unwrap()[0], target);
        assert_eq!(document.descendants(family).unwrap().len(), 3);
    }

    #[test]
    fn classes_accumulate() {
        let spec = ElementSpec::new("div").class("a").class("b").attr("class", "c").class("d");
        let mut document = Document::new();
        let node = document.build(document.body(), spec).unwrap();
        assert_eq!(document.attribute(node, "class").unwrap(), Some("c d"));
    }
}
