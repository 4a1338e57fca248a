//! Navigation seam.
//!
//! Redirect responsibility is centralized behind this trait: the route
//! guard, the session controller's logout, and the pipeline's hard-403
//! teardown navigate; the refresh client never does. Exactly one layer
//! decides on a redirect for any given failure.
//!
//! Navigation APIs on real hosts occasionally no-op (mid-transition router
//! state, detached history). Callers therefore issue the primary
//! [`Navigator::navigate`] and, if [`Navigator::location`] still has not
//! changed after a short delay, follow up with the
//! [`Navigator::force_navigate`] fallback.

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Host navigation interface.
pub trait Navigator: Send + Sync {
    /// Primary navigation call (router push).
    fn navigate(&self, route: &str);

    /// Hard navigation fallback (location assignment).
    fn force_navigate(&self, route: &str);

    /// The current location path.
    fn location(&self) -> String;
}

/// Recording [`Navigator`] double for tests.
///
/// By default it behaves like a responsive router: `navigate` updates the
/// location. The [`RecordingNavigator::unresponsive`] variant records calls
/// without moving, which exercises the hard-navigation fallback.
#[derive(Debug)]
pub struct RecordingNavigator {
    responsive: bool,
    state: Mutex<RecordedState>,
}

#[derive(Debug, Default)]
struct RecordedState {
    location: String,
    navigations: Vec<String>,
    forced: Vec<String>,
}

impl Default for RecordingNavigator {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingNavigator {
    /// A navigator whose primary navigation works.
    #[must_use]
    pub fn new() -> Self {
        Self {
            responsive: true,
            state: Mutex::new(RecordedState {
                location: "/".to_owned(),
                ..RecordedState::default()
            }),
        }
    }

    /// A navigator whose primary navigation silently no-ops.
    #[must_use]
    pub fn unresponsive() -> Self {
        Self {
            responsive: false,
            ..Self::new()
        }
    }

    fn lock(&self) -> MutexGuard<'_, RecordedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// All primary navigation calls, in order.
    #[must_use]
    pub fn navigations(&self) -> Vec<String> {
        self.lock().navigations.clone()
    }

    /// All hard navigation calls, in order.
    #[must_use]
    pub fn forced_navigations(&self) -> Vec<String> {
        self.lock().forced.clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: &str) {
        let mut state = self.lock();
        state.navigations.push(route.to_owned());
        if self.responsive {
            state.location = route.to_owned();
        }
    }

    fn force_navigate(&self, route: &str) {
        let mut state = self.lock();
        state.forced.push(route.to_owned());
        state.location = route.to_owned();
    }

    fn location(&self) -> String {
        self.lock().location.clone()
    }
}
