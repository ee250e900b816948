//! Session handles.
//!
//! A [`HiddenHandle`] owns one engaged session: its context, its filter, the
//! set of nodes it currently holds hidden and its reactor subscription. The
//! registry is the only state shared between sessions.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use horizon_veil_selector::SelectorList;
use parking_lot::Mutex;

use crate::config::ContextScope;
use crate::error::RegistryError;
use crate::host::Host;
use crate::reactor::{MutationReactor, ObservationCapability, ReactorToken};
use crate::registry::SharedMarkerRegistry;
use crate::resolver::resolve_paths;

/// Options for [`HiddenHandle::disengage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DisengageOptions {
    /// Release every mark even if the context has left the document.
    pub force: bool,
}

impl DisengageOptions {
    /// Options for a forced disengage.
    pub fn force() -> Self {
        Self { force: true }
    }
}

struct SessionState<N, S> {
    engaged: bool,
    hidden: HashSet<N>,
    token: Option<ReactorToken<S>>,
}

/// Everything a session needs to recompute, shared with its reactor callback.
pub(crate) struct SessionParts<H: Host> {
    pub(crate) host: H,
    pub(crate) registry: SharedMarkerRegistry<H::Node>,
    pub(crate) context: H::Node,
    pub(crate) filter: SelectorList,
    pub(crate) filter_text: String,
    pub(crate) scope: ContextScope,
    pub(crate) capability: ObservationCapability,
}

struct Session<H: Host> {
    host: H,
    registry: SharedMarkerRegistry<H::Node>,
    context: H::Node,
    filter: SelectorList,
    filter_text: String,
    scope: ContextScope,
    state: Mutex<SessionState<H::Node, H::Subscription>>,
}

impl<H: Host> Session<H> {
    /// Re-resolve the targets and compute the current must-hide set.
    fn must_hide(&self) -> HashSet<H::Node> {
        if !self.host.is_connected(self.context) {
            tracing::debug!(target: "horizon_veil::session", context = ?self.context, "context detached, nothing to hide");
            return HashSet::new();
        }
        let targets = self.host.match_all(self.host.root(), &self.filter);
        resolve_paths(&self.host, self.context, &targets, self.scope).must_hide
    }

    /// Diff the held set against a fresh resolution and apply the change.
    #[tracing::instrument(skip(self), target = "horizon_veil::session", level = "trace", fields(filter = %self.filter_text))]
    fn recompute(&self) {
        let mut state = self.state.lock();
        if !state.engaged {
            tracing::trace!(target: "horizon_veil::session", "session disengaged, ignoring change");
            return;
        }

        let current = self.must_hide();
        let to_release: Vec<H::Node> = state.hidden.difference(&current).copied().collect();
        let to_acquire: Vec<H::Node> = current.difference(&state.hidden).copied().collect();
        if to_release.is_empty() && to_acquire.is_empty() {
            return;
        }
        tracing::debug!(
            target: "horizon_veil::session",
            release = to_release.len(),
            acquire = to_acquire.len(),
            "hidden set changed"
        );

        if let Err(err) = self.registry.release_all(&self.host, to_release.iter().copied()) {
            registry_failure(err);
        }
        for node in &to_release {
            state.hidden.remove(node);
        }
        let acquired = self.registry.acquire_all(&self.host, to_acquire);
        state.hidden.extend(acquired);
    }
}

/// Underflow is fatal: the shared table no longer matches the marks the
/// sessions hold.
fn registry_failure(err: RegistryError) {
    if std::thread::panicking() {
        tracing::error!(target: "horizon_veil::session", %err, "marker registry corrupted");
    } else {
        panic!("marker registry corrupted: {err}");
    }
}

/// An engaged hidden-maintenance session.
///
/// Dropping an engaged handle performs a forced disengage.
///
/// # Example
///
/// ```
/// use horizon_veil::{DisengageOptions, HiddenConfig, HiddenMaintainer, SharedMarkerRegistry};
/// use horizon_veil_core::{ElementSpec, SharedDocument};
///
/// let document = SharedDocument::new();
/// let body = document.body();
/// let dialog = document.build(body, ElementSpec::new("div").id("dialog")).unwrap();
/// let main = document.build(body, ElementSpec::new("main")).unwrap();
///
/// let maintainer = HiddenMaintainer::new(document.clone(), SharedMarkerRegistry::new());
/// let handle = maintainer.engage(HiddenConfig::new("#dialog")).unwrap();
/// assert!(handle.hidden_nodes().contains(&main));
/// assert!(!handle.hidden_nodes().contains(&dialog));
///
/// handle.disengage(DisengageOptions::default());
/// assert_eq!(document.attribute(main, "aria-hidden").unwrap(), None);
/// ```
pub struct HiddenHandle<H: Host> {
    session: Arc<Session<H>>,
    reactor: MutationReactor<H>,
}

impl<H: Host> HiddenHandle<H> {
    /// Hide the initial set, then subscribe to changes under the context.
    pub(crate) fn engage(parts: SessionParts<H>) -> Self {
        let reactor = MutationReactor::new(parts.host.clone(), parts.capability);
        let session = Arc::new(Session {
            host: parts.host,
            registry: parts.registry,
            context: parts.context,
            filter: parts.filter,
            filter_text: parts.filter_text,
            scope: parts.scope,
            state: Mutex::new(SessionState {
                engaged: true,
                hidden: HashSet::new(),
                token: None,
            }),
        });

        {
            let mut state = session.state.lock();
            let initial = session.must_hide();
            let acquired = session.registry.acquire_all(&session.host, initial);
            state.hidden.extend(acquired);

            // Document scope hides nodes above the context, so changes there
            // matter too.
            let observed = match session.scope {
                ContextScope::Context => session.context,
                ContextScope::Document => session.host.root(),
            };
            let weak = Arc::downgrade(&session);
            state.token = Some(reactor.subscribe(observed, move || {
                if let Some(session) = weak.upgrade() {
                    session.recompute();
                }
            }));

            tracing::debug!(
                target: "horizon_veil::session",
                filter = %session.filter_text,
                context = ?session.context,
                hidden = state.hidden.len(),
                "engaged"
            );
        }

        Self { session, reactor }
    }

    /// End the session. Idempotent.
    ///
    /// Unsubscribes, then releases every node this session holds, whether or
    /// not the context is still in the document. Without `force` a registry
    /// underflow during the release panics; with `force` it is logged and the
    /// rest of the release goes ahead.
    pub fn disengage(&self, options: DisengageOptions) {
        let session = &self.session;
        let mut state = session.state.lock();

        if let Some(mut token) = state.token.take() {
            self.reactor.unsubscribe(&mut token);
        }
        let was_engaged = std::mem::replace(&mut state.engaged, false);
        if !was_engaged {
            return;
        }

        if !session.host.is_connected(session.context) {
            tracing::debug!(
                target: "horizon_veil::session",
                filter = %session.filter_text,
                held = state.hidden.len(),
                "context detached, releasing anyway"
            );
        }

        let hidden: Vec<H::Node> = state.hidden.drain().collect();
        if let Err(err) = session.registry.release_all(&session.host, hidden) {
            if options.force {
                tracing::error!(target: "horizon_veil::session", %err, "marker registry corrupted, forced release continued");
            } else {
                registry_failure(err);
            }
        }
        tracing::debug!(target: "horizon_veil::session", filter = %session.filter_text, force = options.force, "disengaged");
    }

    /// Recompute now instead of waiting for a mutation delivery.
    ///
    /// Needed when observation is unavailable. Does nothing once disengaged.
    pub fn refresh(&self) {
        self.session.recompute();
    }

    /// Whether the session is still maintaining its hidden set.
    pub fn is_engaged(&self) -> bool {
        self.session.state.lock().engaged
    }

    /// Whether the session receives mutation deliveries.
    pub fn is_observing(&self) -> bool {
        self.session
            .state
            .lock()
            .token
            .as_ref()
            .is_some_and(|token| token.is_active())
    }

    /// A copy of the nodes this session currently holds hidden.
    pub fn hidden_nodes(&self) -> HashSet<H::Node> {
        self.session.state.lock().hidden.clone()
    }

    /// The resolved context node.
    pub fn context(&self) -> H::Node {
        self.session.context
    }

    /// The filter selector text.
    pub fn filter(&self) -> &str {
        &self.session.filter_text
    }

    /// The context scope in effect.
    pub fn scope(&self) -> ContextScope {
        self.session.scope
    }
}

impl<H: Host> Drop for HiddenHandle<H> {
    fn drop(&mut self) {
        self.disengage(DisengageOptions::force());
    }
}

impl<H: Host> fmt::Debug for HiddenHandle<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.session.state.lock();
        f.debug_struct("HiddenHandle")
            .field("filter", &self.session.filter_text)
            .field("context", &self.session.context)
            .field("engaged", &state.engaged)
            .field("hidden", &state.hidden.len())
            .finish()
    }
}

static_assertions::assert_impl_all!(HiddenHandle<horizon_veil_core::SharedDocument>: Send, Sync);
