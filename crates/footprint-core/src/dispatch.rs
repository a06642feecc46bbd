//! Telemetry dispatch: assemble a tracking event and write it, best-effort.
//!
//! A dispatch waits a short settle delay so the host can finish updating the
//! document title, then gathers identity, session, and client context,
//! builds a [`TrackingEvent`], and inserts it through the [`RecordSink`].
//!
//! Only the latest navigation's dispatch is allowed to fire: starting a new
//! dispatch cancels the pending one. Cancellation is advisory. A dispatch
//! already past its delay still completes, and the sink tolerates the
//! resulting out-of-order or adjacent writes.
//!
//! Nothing here returns an error to the caller. Failures end as `debug`
//! diagnostics on the [`DIAGNOSTICS`] target.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use footprint_db::RecordSink;
use footprint_types::{NavigationTarget, TrackingEvent};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::DIAGNOSTICS;
use crate::background::{WriteHandle, spawn_write};
use crate::classify::classify;
use crate::environment::{SharedEnvironment, SharedResolver};
use crate::identity::VisitorIdentityManager;
use crate::session::SessionManager;

/// Default delay between a navigation and the write of its event.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(100);

struct Inner {
    visitors: VisitorIdentityManager,
    sessions: SessionManager,
    environment: SharedEnvironment,
    users: SharedResolver,
    sink: RecordSink,
    settle_delay: Duration,
    pending: Mutex<Option<CancellationToken>>,
}

/// Assembles and writes tracking events. Clones share the pending slot.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<Inner>,
}

impl Dispatcher {
    /// Create a dispatcher writing to `sink` after `settle_delay`.
    pub fn new(
        visitors: VisitorIdentityManager,
        sessions: SessionManager,
        environment: SharedEnvironment,
        users: SharedResolver,
        sink: RecordSink,
        settle_delay: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                visitors,
                sessions,
                environment,
                users,
                sink,
                settle_delay,
                pending: Mutex::new(None),
            }),
        }
    }

    /// The configured settle delay.
    pub fn settle_delay(&self) -> Duration {
        self.inner.settle_delay
    }

    /// Schedule a tracking write for `target`, superseding any pending one.
    ///
    /// Returns immediately. The returned handle may be dropped; awaiting it
    /// waits until the write has settled (written, failed, or cancelled).
    pub fn dispatch(&self, target: NavigationTarget) -> WriteHandle {
        let token = CancellationToken::new();
        if let Some(previous) = self.inner.replace_pending(token.clone()) {
            previous.cancel();
        }

        let inner = Arc::clone(&self.inner);
        spawn_write("tracking event", async move {
            tokio::select! {
                () = token.cancelled() => {
                    tracing::debug!(
                        target: DIAGNOSTICS,
                        path = %target.pathname,
                        "Dispatch superseded before it fired"
                    );
                    return;
                }
                () = tokio::time::sleep(inner.settle_delay) => {}
            }

            let event = inner.assemble(&target);
            match inner.sink.insert_visit(&event).await {
                Ok(()) => tracing::debug!(
                    event_id = %event.event_id,
                    path = %target.pathname,
                    sink = inner.sink.name(),
                    "Tracked navigation"
                ),
                Err(e) => tracing::debug!(
                    target: DIAGNOSTICS,
                    path = %target.pathname,
                    sink = inner.sink.name(),
                    error = %e,
                    "Tracking write failed"
                ),
            }
        })
    }

    /// Cancel the pending dispatch, if any, without scheduling a new one.
    ///
    /// Used when the host moves to a route that is not tracked, so the
    /// previous route's write does not pick up the new page's metadata.
    pub fn cancel_pending(&self) {
        if let Some(previous) = self.inner.take_pending() {
            previous.cancel();
        }
    }

    /// Build the event `dispatch` would write for `target` right now.
    pub fn assemble(&self, target: &NavigationTarget) -> TrackingEvent {
        self.inner.assemble(target)
    }
}

impl Inner {
    fn replace_pending(&self, token: CancellationToken) -> Option<CancellationToken> {
        match self.pending.lock() {
            Ok(mut slot) => slot.replace(token),
            Err(poisoned) => poisoned.into_inner().replace(token),
        }
    }

    fn take_pending(&self) -> Option<CancellationToken> {
        match self.pending.lock() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        }
    }

    fn resolve_user(&self) -> Option<String> {
        self.users.current_user_id().unwrap_or_else(|e| {
            tracing::debug!(target: DIAGNOSTICS, error = %e, "User resolution failed, tracking anonymously");
            None
        })
    }

    fn assemble(&self, target: &NavigationTarget) -> TrackingEvent {
        let user_id = self.resolve_user();
        let visitor_id = self.visitors.get_or_create_visitor_id();
        let session_id = self.sessions.get_or_create_session_id();
        let user_agent = self.environment.user_agent();
        let context = classify(&user_agent);

        // The live location may already belong to a later navigation.
        let page_url = format!("{}{}", self.environment.origin(), target.pathname);

        TrackingEvent {
            event_id: Uuid::now_v7(),
            visitor_id,
            session_id,
            page_url,
            page_title: self.environment.page_title(),
            referrer: self.environment.referrer().filter(|r| !r.is_empty()),
            user_agent,
            device_type: context.device_type,
            browser: context.browser,
            os: context.os,
            user_id,
            created_at: Utc::now(),
        }
    }
}

impl core::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("sink", &self.inner.sink.name())
            .field("settle_delay", &self.inner.settle_delay)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use footprint_db::{MemorySink, MemoryStore};
    use footprint_types::{Browser, DeviceType, Os};

    use super::*;
    use crate::clock::ManualClock;
    use crate::environment::{HostPage, ResolveError, SignedInUser, UserResolver};
    use crate::session::DEFAULT_INACTIVITY_WINDOW;

    const FIREFOX_LINUX: &str =
        "Mozilla/5.0 (X11; Linux x86_64; rv:125.0) Gecko/20100101 Firefox/125.0";

    struct FailingResolver;

    impl UserResolver for FailingResolver {
        fn current_user_id(&self) -> Result<Option<String>, ResolveError> {
            Err(ResolveError::Unavailable("auth down".to_owned()))
        }
    }

    fn dispatcher(sink: &MemorySink, page: &HostPage, users: SharedResolver) -> Dispatcher {
        let store = MemoryStore::shared();
        let clock = Arc::new(ManualClock::new(1_700_000_000_000));
        Dispatcher::new(
            VisitorIdentityManager::new(store.clone(), clock.clone()),
            SessionManager::new(store, clock, DEFAULT_INACTIVITY_WINDOW),
            Arc::new(page.clone()),
            users,
            RecordSink::from(sink.clone()),
            DEFAULT_SETTLE_DELAY,
        )
    }

    #[test]
    fn assemble_gathers_all_sources() {
        let page = HostPage::new("https://shop.example", FIREFOX_LINUX);
        page.navigate("/shop");
        page.set_title("Shop");
        let users = SignedInUser::new();
        users.set(Some("user-1"));
        let dispatcher = dispatcher(&MemorySink::new(), &page, Arc::new(users));

        let event = dispatcher.assemble(&NavigationTarget::new("/shop"));

        assert_eq!(event.page_url, "https://shop.example/shop");
        assert_eq!(event.page_title, "Shop");
        assert_eq!(event.user_id.as_deref(), Some("user-1"));
        assert_eq!(event.device_type, DeviceType::Desktop);
        assert_eq!(event.browser, Browser::Firefox);
        assert_eq!(event.os, Os::Linux);
        assert!(event.visitor_id.as_str().starts_with("v_"));
        assert!(event.session_id.as_str().starts_with("s_"));
    }

    #[test]
    fn assemble_falls_back_to_pathname_and_anonymous() {
        let page = HostPage::default();
        let dispatcher = dispatcher(&MemorySink::new(), &page, Arc::new(FailingResolver));

        let event = dispatcher.assemble(&NavigationTarget::new("/cart"));

        assert_eq!(event.page_url, "/cart");
        assert_eq!(event.user_id, None);
        assert_eq!(event.referrer, None);
    }

    #[test]
    fn events_share_identity_but_not_event_id() {
        let page = HostPage::new("https://shop.example", "");
        let dispatcher = dispatcher(&MemorySink::new(), &page, Arc::new(SignedInUser::new()));
        let a = dispatcher.assemble(&NavigationTarget::new("/a"));
        let b = dispatcher.assemble(&NavigationTarget::new("/b"));
        assert_eq!(a.visitor_id, b.visitor_id);
        assert_eq!(a.session_id, b.session_id);
        assert_ne!(a.event_id, b.event_id);
    }

    #[tokio::test(start_paused = true)]
    async fn title_is_read_after_the_settle_delay() {
        let sink = MemorySink::new();
        let page = HostPage::new("https://shop.example", FIREFOX_LINUX);
        let dispatcher = dispatcher(&sink, &page, Arc::new(SignedInUser::new()));

        page.navigate("/shop");
        let handle = dispatcher.dispatch(NavigationTarget::new("/shop"));
        page.set_title("Shop | Example");
        handle.settled().await;

        let visits = sink.visits();
        assert_eq!(visits.len(), 1);
        assert_eq!(visits.first().map(|v| v.page_title.as_str()), Some("Shop | Example"));
    }

    #[tokio::test(start_paused = true)]
    async fn failing_sink_settles_quietly() {
        let sink = MemorySink::unavailable("network down");
        let page = HostPage::new("https://shop.example", FIREFOX_LINUX);
        let dispatcher = dispatcher(&sink, &page, Arc::new(SignedInUser::new()));

        let handle = dispatcher.dispatch(NavigationTarget::new("/shop"));
        handle.settled().await;

        assert!(sink.visits().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_dispatch_writes_nothing() {
        let sink = MemorySink::new();
        let page = HostPage::new("https://shop.example", FIREFOX_LINUX);
        let dispatcher = dispatcher(&sink, &page, Arc::new(SignedInUser::new()));

        let handle = dispatcher.dispatch(NavigationTarget::new("/shop"));
        dispatcher.cancel_pending();
        dispatcher.cancel_pending();
        handle.settled().await;

        assert!(sink.visits().is_empty());
    }

    #[test]
    fn page_url_comes_from_the_target_not_the_live_location() {
        let page = HostPage::new("https://shop.example", FIREFOX_LINUX);
        page.navigate("/admin/orders");
        let dispatcher = dispatcher(&MemorySink::new(), &page, Arc::new(SignedInUser::new()));

        let event = dispatcher.assemble(&NavigationTarget::new("/shop"));
        assert_eq!(event.page_url, "https://shop.example/shop");
    }
}
