//! Entry points for engaging sessions.

use horizon_veil_selector::SelectorList;

use crate::config::{ContextRef, HiddenConfig, MaintainerSettings};
use crate::error::{Result, VeilError};
use crate::host::Host;
use crate::registry::SharedMarkerRegistry;
use crate::session::{HiddenHandle, SessionParts};

/// Engages hidden-maintenance sessions against one host and one registry.
///
/// Sessions engaged through maintainers that share a registry may overlap
/// safely.
#[derive(Debug, Clone)]
pub struct HiddenMaintainer<H: Host> {
    host: H,
    registry: SharedMarkerRegistry<H::Node>,
    settings: MaintainerSettings,
}

impl<H: Host> HiddenMaintainer<H> {
    /// Create a maintainer with default settings.
    pub fn new(host: H, registry: SharedMarkerRegistry<H::Node>) -> Self {
        Self {
            host,
            registry,
            settings: MaintainerSettings::default(),
        }
    }

    /// Create a maintainer with its own registry writing the configured
    /// marker.
    pub fn from_settings(host: H, settings: MaintainerSettings) -> Self {
        let registry = SharedMarkerRegistry::with_marker(settings.marker_spec());
        Self {
            host,
            registry,
            settings,
        }
    }

    /// Replace the settings.
    ///
    /// The registry keeps the marker it was created with; a different
    /// marker in `settings` is ignored with a warning.
    pub fn with_settings(mut self, settings: MaintainerSettings) -> Self {
        if settings.marker_spec() != self.registry.marker() {
            tracing::warn!(
                target: "horizon_veil::maintainer",
                configured = %settings.marker_attribute,
                registry = %self.registry.marker().attribute,
                "registry marker differs from settings, keeping the registry's"
            );
        }
        self.settings = settings;
        self
    }

    /// The host this maintainer works on.
    pub fn host(&self) -> &H {
        &self.host
    }

    /// The shared registry.
    pub fn registry(&self) -> &SharedMarkerRegistry<H::Node> {
        &self.registry
    }

    /// The active settings.
    pub fn settings(&self) -> &MaintainerSettings {
        &self.settings
    }

    /// Validate `config`, hide the initial set and start reacting to
    /// mutations under the context.
    ///
    /// Configuration errors are reported before anything is marked.
    #[tracing::instrument(skip(self), target = "horizon_veil::maintainer", level = "debug")]
    pub fn engage(&self, config: HiddenConfig<H::Node>) -> Result<HiddenHandle<H>> {
        let filter_text = config.filter.trim();
        if filter_text.is_empty() {
            return Err(VeilError::EmptyFilter);
        }
        let filter = SelectorList::parse(filter_text)?;
        let context = self.resolve_context(config.context)?;

        Ok(HiddenHandle::engage(SessionParts {
            host: self.host.clone(),
            registry: self.registry.clone(),
            context,
            filter,
            filter_text: filter_text.to_string(),
            scope: config.scope.unwrap_or(self.settings.context_scope),
            capability: self.settings.observation(),
        }))
    }

    fn resolve_context(&self, context: Option<ContextRef<H::Node>>) -> Result<H::Node> {
        match context {
            None => Ok(self.host.root()),
            Some(ContextRef::Node(node)) => {
                if self.host.contains(node) {
                    Ok(node)
                } else {
                    Err(VeilError::UnknownContext)
                }
            }
            Some(ContextRef::Selector(selector)) => {
                let list = SelectorList::parse(&selector)?;
                self.host
                    .match_all(self.host.root(), &list)
                    .first()
                    .copied()
                    .ok_or(VeilError::ContextNotFound(selector))
            }
        }
    }
}

/// Engage a session in one call.
pub fn maintain_hidden<H: Host>(
    host: &H,
    registry: &SharedMarkerRegistry<H::Node>,
    config: HiddenConfig<H::Node>,
) -> Result<HiddenHandle<H>> {
    HiddenMaintainer::new(host.clone(), registry.clone()).engage(config)
}
