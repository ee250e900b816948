//! Mutation reactor: re-run a computation when a subtree changes.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::host::MutationSource;

/// Whether mutation observation may be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ObservationCapability {
    /// Subscribe through the host.
    #[default]
    Available,
    /// Never subscribe; every token is inert.
    Unavailable,
}

/// A live or inert reactor subscription.
///
/// Dropping a token does not unsubscribe; pass it to
/// [`MutationReactor::unsubscribe`].
pub struct ReactorToken<S> {
    subscription: Option<S>,
    active: Arc<AtomicBool>,
}

impl<S> ReactorToken<S> {
    fn inert() -> Self {
        Self {
            subscription: None,
            active: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Whether the token never subscribed.
    pub fn is_inert(&self) -> bool {
        self.subscription.is_none() && !self.is_active()
    }

    /// Whether callbacks are still delivered.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

impl<S> std::fmt::Debug for ReactorToken<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReactorToken")
            .field("subscribed", &self.subscription.is_some())
            .field("active", &self.is_active())
            .finish()
    }
}

/// Subscribes callbacks to subtree mutations on a host.
#[derive(Debug, Clone)]
pub struct MutationReactor<H> {
    host: H,
    capability: ObservationCapability,
}

impl<H: MutationSource> MutationReactor<H> {
    /// Create a reactor over `host`.
    pub fn new(host: H, capability: ObservationCapability) -> Self {
        Self { host, capability }
    }

    /// The capability this reactor was built with.
    pub fn capability(&self) -> ObservationCapability {
        self.capability
    }

    /// Call `on_change` whenever descendants of `context` are added or
    /// removed.
    ///
    /// Returns an inert token when observation is unavailable or the host
    /// declines to observe.
    pub fn subscribe<F>(&self, context: H::Node, on_change: F) -> ReactorToken<H::Subscription>
    where
        F: Fn() + Send + Sync + 'static,
    {
        if self.capability == ObservationCapability::Unavailable {
            tracing::debug!(target: "horizon_veil::reactor", ?context, "observation unavailable, subscription is inert");
            return ReactorToken::inert();
        }

        let active = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&active);
        let subscription = self.host.observe(
            context,
            Box::new(move || {
                if flag.load(Ordering::SeqCst) {
                    on_change();
                }
            }),
        );

        match subscription {
            Some(subscription) => {
                tracing::trace!(target: "horizon_veil::reactor", ?context, "subscribed");
                ReactorToken {
                    subscription: Some(subscription),
                    active,
                }
            }
            None => {
                tracing::debug!(target: "horizon_veil::reactor", ?context, "host declined to observe, subscription is inert");
                ReactorToken::inert()
            }
        }
    }

    /// Stop delivery. Callbacks already scheduled for this token return
    /// without calling `on_change`. Calling this twice is harmless.
    pub fn unsubscribe(&self, token: &mut ReactorToken<H::Subscription>) {
        token.active.store(false, Ordering::SeqCst);
        if let Some(subscription) = token.subscription.take() {
            self.host.unobserve(subscription);
            tracing::trace!(target: "horizon_veil::reactor", "unsubscribed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use horizon_veil_core::{ElementSpec, SharedDocument};
    use std::sync::atomic::AtomicUsize;

    fn counter() -> (Arc<AtomicUsize>, impl Fn() + Send + Sync + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let inner = Arc::clone(&count);
        (count, move || {
            inner.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn coalesces_a_burst_into_one_call() {
        let document = SharedDocument::new();
        let family = document
            .build(document.body(), ElementSpec::new("div").id("family"))
            .unwrap();
        let reactor = MutationReactor::new(document.clone(), ObservationCapability::Available);
        let (count, on_change) = counter();
        let mut token = reactor.subscribe(family, on_change);
        assert!(token.is_active());

        for _ in 0..4 {
            document.append_child(family, document.create_element("div")).unwrap();
        }
        document.deliver_mutations();
        assert_eq!(count.load(Ordering::SeqCst), 1);

        reactor.unsubscribe(&mut token);
        reactor.unsubscribe(&mut token);
        document.append_child(family, document.create_element("div")).unwrap();
        document.deliver_mutations();
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(document.observer_count(), 0);
    }

    #[test]
    fn unavailable_capability_gives_inert_token() {
        let document = SharedDocument::new();
        let reactor = MutationReactor::new(document.clone(), ObservationCapability::Unavailable);
        let (count, on_change) = counter();
        let mut token = reactor.subscribe(document.body(), on_change);

        assert!(token.is_inert());
        assert_eq!(document.observer_count(), 0);
        document.append_child(document.body(), document.create_element("div")).unwrap();
        document.deliver_mutations();
        assert_eq!(count.load(Ordering::SeqCst), 0);
        reactor.unsubscribe(&mut token);
    }

    #[test]
    fn unsubscribe_during_a_cycle_suppresses_the_pending_callback() {
        let document = SharedDocument::new();
        let body = document.body();
        let reactor = MutationReactor::new(document.clone(), ObservationCapability::Available);
        let slot: Arc<parking_lot::Mutex<Option<ReactorToken<_>>>> =
            Arc::new(parking_lot::Mutex::new(None));

        // Connected first, so it runs before the reactor's callback.
        let (early_reactor, early_slot) = (reactor.clone(), Arc::clone(&slot));
        let earlier = document.observe(body, move |_| {
            if let Some(token) = early_slot.lock().as_mut() {
                early_reactor.unsubscribe(token);
            }
        });
        let (count, on_change) = counter();
        *slot.lock() = Some(reactor.subscribe(body, on_change));

        document.append_child(body, document.create_element("div")).unwrap();
        document.deliver_mutations();

        assert!(slot.lock().as_ref().is_some_and(|token| !token.is_active()));
        assert_eq!(count.load(Ordering::SeqCst), 0);
        document.unobserve(earlier);
    }
}
