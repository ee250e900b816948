//! Session and maintainer configuration.
//!
//! [`HiddenConfig`] describes one session: which elements stay exposed and
//! the context that bounds the work. [`MaintainerSettings`] holds the
//! process-level knobs and can be loaded from TOML:
//!
//! ```
//! use horizon_veil::{ContextScope, MaintainerSettings};
//!
//! let settings = MaintainerSettings::from_toml_str(r#"
//!     marker-attribute = "data-veiled"
//!     hidden-value = "yes"
//!     observe-mutations = false
//!     context-scope = "document"
//! "#).unwrap();
//!
//! assert_eq!(settings.marker_attribute, "data-veiled");
//! assert!(!settings.observe_mutations);
//! assert_eq!(settings.context_scope, ContextScope::Document);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{Result, VeilError};
use crate::reactor::ObservationCapability;
use crate::registry::MarkerSpec;

/// How far outside the context the maintainer reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContextScope {
    /// The context is a strict upper bound. Nothing outside it is touched.
    #[default]
    Context,
    /// Siblings along the path from the document root to the context are
    /// hidden as well.
    Document,
}

/// How a session's context is given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextRef<N> {
    /// A specific node.
    Node(N),
    /// A selector; the first match in document order is used.
    Selector(String),
}

/// Configuration for one hidden-maintenance session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HiddenConfig<N> {
    /// Selector list naming the elements that stay exposed.
    pub filter: String,
    /// The bounding context. `None` means the document root.
    pub context: Option<ContextRef<N>>,
    /// Overrides [`MaintainerSettings::context_scope`] for this session.
    pub scope: Option<ContextScope>,
}

impl<N> HiddenConfig<N> {
    /// Create a config with the given filter and no context.
    pub fn new(filter: impl Into<String>) -> Self {
        Self {
            filter: filter.into(),
            context: None,
            scope: None,
        }
    }

    /// Set the context.
    pub fn context(mut self, context: ContextRef<N>) -> Self {
        self.context = Some(context);
        self
    }

    /// Set the context to a node.
    pub fn context_node(self, node: N) -> Self {
        self.context(ContextRef::Node(node))
    }

    /// Set the context to the first element matching a selector.
    pub fn context_selector(self, selector: impl Into<String>) -> Self {
        self.context(ContextRef::Selector(selector.into()))
    }

    /// Override the context scope for this session.
    pub fn scope(mut self, scope: ContextScope) -> Self {
        self.scope = Some(scope);
        self
    }
}

/// Maintainer-wide settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct MaintainerSettings {
    /// Attribute written on hidden nodes.
    pub marker_attribute: String,
    /// Value written while hidden.
    pub hidden_value: String,
    /// Whether sessions subscribe to mutations. When false, sessions only
    /// change on [`HiddenHandle::refresh`](crate::HiddenHandle::refresh).
    pub observe_mutations: bool,
    /// Default context scope for sessions.
    pub context_scope: ContextScope,
}

impl Default for MaintainerSettings {
    fn default() -> Self {
        let marker = MarkerSpec::default();
        Self {
            marker_attribute: marker.attribute,
            hidden_value: marker.hidden_value,
            observe_mutations: true,
            context_scope: ContextScope::default(),
        }
    }
}

impl MaintainerSettings {
    /// Parse settings from TOML. Missing keys take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let settings: Self = toml::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Serialize the settings to TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string(self)?)
    }

    /// Check that the settings are usable.
    pub fn validate(&self) -> Result<()> {
        let attribute = self.marker_attribute.trim();
        if attribute.is_empty() || attribute.contains(char::is_whitespace) {
            return Err(VeilError::InvalidSettings(format!(
                "marker attribute '{}' is not a valid attribute name",
                self.marker_attribute
            )));
        }
        Ok(())
    }

    /// The marker written by registries built from these settings.
    pub fn marker_spec(&self) -> MarkerSpec {
        MarkerSpec::new(self.marker_attribute.clone(), self.hidden_value.clone())
    }

    /// Whether sessions may observe mutations.
    pub fn observation(&self) -> ObservationCapability {
        if self.observe_mutations {
            ObservationCapability::Available
        } else {
            ObservationCapability::Unavailable
        }
    }
}
