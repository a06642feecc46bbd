//! Per-navigation activation: exclusion, deduplication, then dispatch.

use footprint_db::{RecordSink, SharedStore};
use footprint_types::NavigationTarget;

use crate::background::WriteHandle;
use crate::clock::SharedClock;
use crate::config::TrackingConfig;
use crate::dedup::{ExclusionPolicy, NavigationDeduplicator};
use crate::dispatch::Dispatcher;
use crate::environment::{SharedEnvironment, SharedResolver};
use crate::identity::VisitorIdentityManager;
use crate::session::SessionManager;

/// Outcome of [`Tracker::activate`].
#[derive(Debug)]
pub enum Activation {
    /// The path is under an excluded prefix. Nothing was recorded.
    Excluded,
    /// The path repeats the last tracked target.
    Duplicate,
    /// A tracking write was scheduled.
    Dispatched(WriteHandle),
}

impl Activation {
    /// Whether a write was scheduled.
    pub const fn is_dispatched(&self) -> bool {
        matches!(self, Self::Dispatched(_))
    }

    /// Wait for the scheduled write, if any, to settle.
    pub async fn settled(self) {
        if let Self::Dispatched(handle) = self {
            handle.settled().await;
        }
    }
}

/// Navigation observer owned by the host's routing layer.
///
/// Dropping the tracker (a full reload) forgets the last tracked target.
#[derive(Debug)]
pub struct Tracker {
    exclusion: ExclusionPolicy,
    dedup: NavigationDeduplicator,
    dispatcher: Dispatcher,
}

impl Tracker {
    /// Create a tracker from its parts.
    pub const fn new(exclusion: ExclusionPolicy, dispatcher: Dispatcher) -> Self {
        Self {
            exclusion,
            dedup: NavigationDeduplicator::new(),
            dispatcher,
        }
    }

    /// Wire a tracker from configuration and the host's collaborators.
    pub fn from_config(
        config: &TrackingConfig,
        store: SharedStore,
        clock: SharedClock,
        environment: SharedEnvironment,
        users: SharedResolver,
        sink: RecordSink,
    ) -> Self {
        let visitors = VisitorIdentityManager::new(store.clone(), clock.clone());
        let sessions = SessionManager::new(store, clock, config.session_inactivity());
        let dispatcher = Dispatcher::new(
            visitors,
            sessions,
            environment,
            users,
            sink,
            config.title_settle_delay(),
        );
        Self::new(
            ExclusionPolicy::new(config.excluded_prefixes.iter().cloned()),
            dispatcher,
        )
    }

    /// Report a route change to `pathname`.
    ///
    /// Safe to call repeatedly for the same path. Never fails. An excluded
    /// path cancels any pending dispatch but leaves the dedup slot alone.
    pub fn activate(&mut self, pathname: &str) -> Activation {
        if self.exclusion.is_excluded(pathname) {
            // Leaving for an untracked route still supersedes the last dispatch.
            self.dispatcher.cancel_pending();
            tracing::trace!(path = pathname, "Excluded route, not tracked");
            return Activation::Excluded;
        }
        if !self.dedup.should_track(pathname) {
            tracing::trace!(path = pathname, "Repeated route, not tracked");
            return Activation::Duplicate;
        }
        Activation::Dispatched(self.dispatcher.dispatch(NavigationTarget::new(pathname)))
    }

    /// Forget the last tracked target.
    pub fn reset(&mut self) {
        self.dedup.reset();
    }

    /// The dispatcher this tracker feeds.
    pub const fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// The exclusion policy in force.
    pub const fn exclusion(&self) -> &ExclusionPolicy {
        &self.exclusion
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use footprint_db::{MemorySink, MemoryStore};

    use super::*;
    use crate::clock::ManualClock;
    use crate::environment::{Anonymous, HostPage};

    fn tracker(sink: &MemorySink) -> Tracker {
        Tracker::from_config(
            &TrackingConfig::default(),
            MemoryStore::shared(),
            Arc::new(ManualClock::new(1_700_000_000_000)),
            Arc::new(HostPage::new("https://shop.example", "")),
            Arc::new(Anonymous),
            RecordSink::from(sink.clone()),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_path_dispatches_once() {
        let sink = MemorySink::new();
        let mut tracker = tracker(&sink);

        let first = tracker.activate("/shop");
        assert!(first.is_dispatched());
        assert!(matches!(tracker.activate("/shop"), Activation::Duplicate));
        first.settled().await;

        assert_eq!(sink.visits().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn excluded_path_leaves_dedup_slot_alone() {
        let sink = MemorySink::new();
        let mut tracker = tracker(&sink);

        tracker.activate("/shop").settled().await;
        assert!(matches!(tracker.activate("/admin/orders"), Activation::Excluded));
        assert!(matches!(tracker.activate("/admin/orders"), Activation::Excluded));
        assert!(matches!(tracker.activate("/shop"), Activation::Duplicate));

        assert_eq!(sink.visits().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_allows_the_same_path_again() {
        let sink = MemorySink::new();
        let mut tracker = tracker(&sink);

        tracker.activate("/shop").settled().await;
        tracker.reset();
        tracker.activate("/shop").settled().await;

        assert_eq!(sink.visits().len(), 2);
    }

    #[test]
    fn config_prefixes_reach_the_policy() {
        let tracker = tracker(&MemorySink::new());
        assert_eq!(tracker.exclusion().prefixes(), ["/admin".to_owned()]);
        assert_eq!(
            tracker.dispatcher().settle_delay(),
            TrackingConfig::default().title_settle_delay()
        );
    }
}
