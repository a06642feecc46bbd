//! Navigation deduplication and the excluded-route policy.
//!
//! The host may report the same route several times in a row (re-renders,
//! hash changes, strict-mode double mounts). Only the first report of a
//! target is tracked; the slot resets when the deduplicator is dropped or
//! [`NavigationDeduplicator::reset`] is called.

/// Single-slot memory of the last tracked navigation target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavigationDeduplicator {
    last: Option<String>,
}

impl NavigationDeduplicator {
    /// Create an empty deduplicator.
    pub const fn new() -> Self {
        Self { last: None }
    }

    /// Whether `target` should be tracked.
    ///
    /// Returns `false` and leaves state unchanged if `target` equals the
    /// last recorded target; otherwise records it and returns `true`.
    pub fn should_track(&mut self, target: &str) -> bool {
        if self.last.as_deref() == Some(target) {
            return false;
        }
        self.last = Some(target.to_owned());
        true
    }

    /// The last recorded target, if any.
    pub fn last(&self) -> Option<&str> {
        self.last.as_deref()
    }

    /// Forget the last target, as a full reload would.
    pub fn reset(&mut self) {
        self.last = None;
    }
}

/// Path prefixes that are never tracked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExclusionPolicy {
    prefixes: Vec<String>,
}

impl ExclusionPolicy {
    /// Exclude every path starting with one of `prefixes`.
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            prefixes: prefixes
                .into_iter()
                .map(Into::into)
                .filter(|p: &String| !p.is_empty())
                .collect(),
        }
    }

    /// A policy that excludes nothing.
    pub const fn none() -> Self {
        Self {
            prefixes: Vec::new(),
        }
    }

    /// Whether `path` falls under an excluded prefix.
    pub fn is_excluded(&self, path: &str) -> bool {
        self.prefixes.iter().any(|prefix| path.starts_with(prefix.as_str()))
    }

    /// The configured prefixes.
    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }
}

impl Default for ExclusionPolicy {
    fn default() -> Self {
        Self::new(["/admin"])
    }
}
