//! Logging and debugging facilities for Horizon Veil documents.
//!
//! This module provides:
//! - Target names for filtering `tracing` output by subsystem
//! - Debug visualization for document trees
//!
//! # Tracing Integration
//!
//! Horizon Veil uses the `tracing` crate for instrumentation. To see logs,
//! install a subscriber in your application:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("horizon_veil_core::document=trace")
//!     .init();
//! ```
//!
//! # Debug Visualization
//!
//! Use [`DocumentTreeDebug`] to dump a subtree with its attributes:
//!
//! ```
//! use horizon_veil_core::{Document, ElementSpec};
//! use horizon_veil_core::logging::DocumentTreeDebug;
//!
//! let mut document = Document::new();
//! document.build(document.body(), ElementSpec::new("div").id("family")).unwrap();
//!
//! let output = DocumentTreeDebug::new().format_subtree(&document, document.root()).unwrap();
//! assert!(output.contains("div#family"));
//! ```

use std::fmt::Write as FmtWrite;

use crate::document::{Document, NodeId};
use crate::error::DocumentResult;

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Core crate target.
    pub const CORE: &str = "horizon_veil_core";
    /// Document tree target.
    pub const DOCUMENT: &str = "horizon_veil_core::document";
    /// Observer connection target.
    pub const OBSERVER: &str = "horizon_veil_core::observer";
}

/// Style options for tree visualization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TreeStyle {
    /// ASCII characters for tree branches.
    Ascii,
    /// Unicode box-drawing characters.
    #[default]
    Unicode,
    /// Compact single-line-per-node representation.
    Compact,
}

/// Configuration for document tree debug output.
#[derive(Debug, Clone)]
pub struct TreeFormatOptions {
    /// The style of tree visualization.
    pub style: TreeStyle,
    /// Whether to show node IDs.
    pub show_ids: bool,
    /// Whether to show attributes other than `id` and `class`.
    pub show_attributes: bool,
    /// Maximum depth to traverse (None for unlimited).
    pub max_depth: Option<usize>,
    /// Indent size for each level.
    pub indent_size: usize,
}

impl Default for TreeFormatOptions {
    fn default() -> Self {
        Self {
            style: TreeStyle::default(),
            show_ids: false,
            show_attributes: true,
            max_depth: None,
            indent_size: 2,
        }
    }
}

impl TreeFormatOptions {
    /// Create options for detailed debugging output.
    pub fn detailed() -> Self {
        Self {
            show_ids: true,
            ..Default::default()
        }
    }

    /// Create options for minimal output.
    pub fn minimal() -> Self {
        Self {
            show_ids: false,
            show_attributes: false,
            ..Default::default()
        }
    }
}

/// Debug utility for visualizing document trees.
///
/// Each element is rendered as `tag#id.class` followed by its remaining
/// attributes, e.g. `div#uncle-1 [aria-hidden="true"]`.
#[derive(Debug, Clone, Default)]
pub struct DocumentTreeDebug {
    options: TreeFormatOptions,
}

impl DocumentTreeDebug {
    /// Create a new debug visualizer with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a debug visualizer with custom options.
    pub fn with_options(options: TreeFormatOptions) -> Self {
        Self { options }
    }

    /// Format a subtree starting from a specific element.
    pub fn format_subtree(&self, document: &Document, root: NodeId) -> DocumentResult<String> {
        let mut output = String::new();
        self.format_subtree_into(document, root, 0, true, &mut output)?;
        Ok(output)
    }

    fn format_subtree_into(
        &self,
        document: &Document,
        id: NodeId,
        depth: usize,
        is_last: bool,
        output: &mut String,
    ) -> DocumentResult<()> {
        if self.options.max_depth.is_some_and(|max| depth > max) {
            return Ok(());
        }

        output.push_str(&self.build_prefix(depth, is_last));
        output.push_str(&Self::label(document, id)?);

        if self.options.show_attributes {
            for (name, value) in document.attributes(id)? {
                if name != "id" && name != "class" {
                    let _ = write!(output, " [{}=\"{}\"]", name, value);
                }
            }
        }
        if self.options.show_ids {
            let _ = write!(output, " {:?}", id);
        }
        output.push('\n');

        let children = document.children(id)?;
        let child_count = children.len();
        for (i, &child) in children.iter().enumerate() {
            self.format_subtree_into(document, child, depth + 1, i + 1 == child_count, output)?;
        }
        Ok(())
    }

    /// Render `tag#id.class.class`.
    fn label(document: &Document, id: NodeId) -> DocumentResult<String> {
        let mut label = document.local_name(id)?.to_string();
        if let Some(element_id) = document.attribute(id, "id")? {
            label.push('#');
            label.push_str(element_id);
        }
        if let Some(classes) = document.attribute(id, "class")? {
            for class in classes.split_ascii_whitespace() {
                label.push('.');
                label.push_str(class);
            }
        }
        Ok(label)
    }

    fn build_prefix(&self, depth: usize, is_last: bool) -> String {
        if depth == 0 {
            return String::new();
        }

        let (branch, tee, corner) = match self.options.style {
            TreeStyle::Ascii => ("|", "+--", "`--"),
            TreeStyle::Unicode => ("\u{2502}", "\u{251c}\u{2500}\u{2500}", "\u{2514}\u{2500}\u{2500}"),
            TreeStyle::Compact => ("", "-", "-"),
        };

        let mut prefix = String::new();
        for _ in 0..(depth - 1) {
            prefix.push_str(branch);
            prefix.push_str(&" ".repeat(self.options.indent_size));
        }
        prefix.push_str(if is_last { corner } else { tee });
        prefix.push(' ');
        prefix
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::ElementSpec;

    fn fixture() -> (Document, NodeId) {
        let mut document = Document::new();
        let family = document
            .build(
                document.body(),
                ElementSpec::new("div").id("family").class("box").children([
                    ElementSpec::new("div").id("parent"),
                    ElementSpec::new("div").id("uncle").attr("aria-hidden", "true"),
                ]),
            )
            .unwrap();
        (document, family)
    }

    #[test]
    fn formats_labels_and_attributes() {
        let (document, family) = fixture();
        let output = DocumentTreeDebug::new().format_subtree(&document, family).unwrap();

        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "div#family.box");
        assert!(lines[1].ends_with("div#parent"));
        assert!(lines[2].ends_with("div#uncle [aria-hidden=\"true\"]"));
        assert!(lines[2].starts_with('\u{2514}'));
    }

    #[test]
    fn minimal_hides_attributes() {
        let (document, family) = fixture();
        let output = DocumentTreeDebug::with_options(TreeFormatOptions::minimal())
            .format_subtree(&document, family)
            .unwrap();
        assert!(!output.contains("aria-hidden"));
    }

    #[test]
    fn max_depth_limits_output() {
        let (document, _) = fixture();
        let options = TreeFormatOptions {
            max_depth: Some(1),
            style: TreeStyle::Ascii,
            ..Default::default()
        };
        let output = DocumentTreeDebug::with_options(options)
            .format_subtree(&document, document.root())
            .unwrap();
        assert_eq!(output, "html\n`-- body\n");
    }
}
