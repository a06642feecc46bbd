//! Seams to the host application.
//!
//! The core reads page metadata through [`PageEnvironment`] and the signed-in
//! user through [`UserResolver`]. Both are read at dispatch time, after the
//! settle delay, so the host's latest values are captured.

use std::sync::{Arc, RwLock};

/// Errors a [`UserResolver`] may report. They are never surfaced to callers.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// The authentication backend could not be reached.
    #[error("auth backend unavailable: {0}")]
    Unavailable(String),

    /// The stored credentials were invalid or expired.
    #[error("auth session invalid: {0}")]
    InvalidSession(String),
}

/// Current page metadata supplied by the host.
pub trait PageEnvironment: Send + Sync {
    /// Scheme and host of the site, without a trailing slash.
    fn origin(&self) -> String;

    /// Full URL of the current page.
    fn page_url(&self) -> String;

    /// Current document title.
    fn page_title(&self) -> String;

    /// Referring URL, if any.
    fn referrer(&self) -> Option<String>;

    /// The client's raw user-agent string.
    fn user_agent(&self) -> String;
}

/// Resolves the authenticated user, if any.
pub trait UserResolver: Send + Sync {
    /// The current user's identifier, or `None` when signed out.
    fn current_user_id(&self) -> Result<Option<String>, ResolveError>;
}

/// Shared handle to a page environment.
pub type SharedEnvironment = Arc<dyn PageEnvironment>;

/// Shared handle to a user resolver.
pub type SharedResolver = Arc<dyn UserResolver>;

// ---------------------------------------------------------------------------
// HostPage
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
struct PageState {
    origin: String,
    pathname: String,
    title: String,
    referrer: Option<String>,
    user_agent: String,
}

/// A [`PageEnvironment`] whose values the host updates as it navigates.
///
/// Clones share state, so the host keeps one handle and the core another.
#[derive(Debug, Clone, Default)]
pub struct HostPage {
    state: Arc<RwLock<PageState>>,
}

impl HostPage {
    /// Create a page for a site at `origin` (e.g. `https://shop.example`)
    /// seen through `user_agent`.
    pub fn new(origin: &str, user_agent: &str) -> Self {
        let page = Self::default();
        page.update(|s| {
            s.origin = origin.trim_end_matches('/').to_owned();
            s.user_agent = user_agent.to_owned();
        });
        page
    }

    fn update(&self, f: impl FnOnce(&mut PageState)) {
        match self.state.write() {
            Ok(mut state) => f(&mut state),
            Err(poisoned) => f(&mut poisoned.into_inner()),
        }
    }

    fn read<T>(&self, f: impl FnOnce(&PageState) -> T) -> T {
        match self.state.read() {
            Ok(state) => f(&state),
            Err(poisoned) => f(&poisoned.into_inner()),
        }
    }

    /// Record a route change. The previous URL becomes the referrer.
    pub fn navigate(&self, pathname: &str) {
        self.update(|s| {
            if !s.pathname.is_empty() {
                s.referrer = Some(format!("{}{}", s.origin, s.pathname));
            }
            s.pathname = pathname.to_owned();
        });
    }

    /// Set the document title.
    pub fn set_title(&self, title: &str) {
        self.update(|s| s.title = title.to_owned());
    }

    /// Set the referrer explicitly (e.g. the external referrer on first load).
    pub fn set_referrer(&self, referrer: Option<&str>) {
        self.update(|s| s.referrer = referrer.map(str::to_owned));
    }
}

impl PageEnvironment for HostPage {
    fn origin(&self) -> String {
        self.read(|s| s.origin.clone())
    }

    fn page_url(&self) -> String {
        self.read(|s| format!("{}{}", s.origin, s.pathname))
    }

    fn page_title(&self) -> String {
        self.read(|s| s.title.clone())
    }

    fn referrer(&self) -> Option<String> {
        self.read(|s| s.referrer.clone())
    }

    fn user_agent(&self) -> String {
        self.read(|s| s.user_agent.clone())
    }
}

// ---------------------------------------------------------------------------
// Resolvers
// ---------------------------------------------------------------------------

/// A resolver for hosts without authentication.
#[derive(Debug, Clone, Copy, Default)]
pub struct Anonymous;

impl UserResolver for Anonymous {
    fn current_user_id(&self) -> Result<Option<String>, ResolveError> {
        Ok(None)
    }
}

/// A resolver whose user the host sets on sign-in and clears on sign-out.
#[derive(Debug, Clone, Default)]
pub struct SignedInUser {
    user_id: Arc<RwLock<Option<String>>>,
}

impl SignedInUser {
    /// Create a resolver with nobody signed in.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `user_id` as signed in, or sign out with `None`.
    pub fn set(&self, user_id: Option<&str>) {
        let value = user_id.map(str::to_owned);
        match self.user_id.write() {
            Ok(mut slot) => *slot = value,
            Err(poisoned) => *poisoned.into_inner() = value,
        }
    }
}

impl UserResolver for SignedInUser {
    fn current_user_id(&self) -> Result<Option<String>, ResolveError> {
        self.user_id
            .read()
            .map(|slot| slot.clone())
            .map_err(|e| ResolveError::Unavailable(e.to_string()))
    }
}
