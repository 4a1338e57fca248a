//! The session controller: the high-level authentication state machine.
//!
//! Owns the `{is_authenticated, user, is_loading, error}` state the UI
//! reads, and drives it through three entry points:
//!
//! * [`SessionController::login`] - ingest a token and user issued by a
//!   prior API call; no network
//! * [`SessionController::logout`] - suppress refresh, best-effort remote
//!   logout, then an unconditional local wipe and redirect; success and
//!   failure branches converge on identical state
//! * [`SessionController::initialize`] - on mount or path change, decide
//!   whether the current route needs a verified session and, if so,
//!   attempt a silent refresh before declaring the user unauthenticated
//!
//! The controller never redirects on a failed initialization; rendering
//! the redirect (or a placeholder) is the route guard's decision. The one
//! exception is logout, which always lands on the login route.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::{
    config::Config,
    error::{Error, ErrorKind, Result},
    http::{Client, Pipeline},
    navigator::Navigator,
    protocol::{
        self,
        auth::picture_claim,
        profile::{ProfileResponse, User},
    },
    refresh::RefreshCoordinator,
    storage::{ClientStorage, PROFILE_IMAGE_KEY},
    token::SessionHandle,
};

/// Authentication status visible to the UI.
///
/// Invariant: `is_authenticated` implies `user` is present and a non-empty
/// token was observed at the time it was set. Because the token store is
/// written by other code paths too, the two can transiently disagree -
/// which is why the route guard double-checks the store.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SessionState {
    pub is_authenticated: bool,
    pub user: Option<User>,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl Default for SessionState {
    /// The pre-initialization state: loading, unauthenticated.
    fn default() -> Self {
        Self {
            is_authenticated: false,
            user: None,
            is_loading: true,
            error: None,
        }
    }
}

impl SessionState {
    /// The fully logged-out shape that logout and failed refresh
    /// converge on.
    #[must_use]
    pub fn logged_out() -> Self {
        Self {
            is_authenticated: false,
            user: None,
            is_loading: false,
            error: None,
        }
    }
}

/// High-level session controller.
///
/// Clones share all state; hand clones to the route guard and to feature
/// code that needs [`SessionController::http`].
#[derive(Clone)]
pub struct SessionController {
    config: Arc<Config>,
    session: SessionHandle,
    coordinator: RefreshCoordinator,
    pipeline: Pipeline,
    storage: Arc<dyn ClientStorage>,
    navigator: Arc<dyn Navigator>,
    state: Arc<Mutex<SessionState>>,
}

impl SessionController {
    /// Assembles the whole session stack: a fresh session handle, the
    /// cookie-carrying HTTP client, the refresh coordinator and the
    /// interceptor pipeline.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built or the configured
    /// endpoint URLs are invalid.
    pub fn new(
        config: Config,
        storage: Arc<dyn ClientStorage>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self> {
        let config = Arc::new(config);
        let session = SessionHandle::new();

        let client = Arc::new(Client::new(&config)?);
        // The coordinator bypasses the pipeline: a refresh must neither
        // attach a bearer header nor recurse into 401 handling.
        let coordinator = RefreshCoordinator::new(
            client.unlimited.clone(),
            config.refresh_url()?,
            session.clone(),
        );
        let pipeline = Pipeline::new(
            client,
            coordinator.clone(),
            session.clone(),
            Arc::clone(&storage),
            Arc::clone(&navigator),
            config.routes.login_route(),
        );

        Ok(Self {
            config,
            session,
            coordinator,
            pipeline,
            storage,
            navigator,
            state: Arc::new(Mutex::new(SessionState::default())),
        })
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// A copy of the current session state.
    #[must_use]
    pub fn snapshot(&self) -> SessionState {
        self.lock().clone()
    }

    /// The injected session handle (token store + suppression flag).
    #[must_use]
    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    /// The refresh coordinator.
    #[must_use]
    pub fn coordinator(&self) -> &RefreshCoordinator {
        &self.coordinator
    }

    /// The interceptor pipeline all feature-level API calls go through.
    #[must_use]
    pub fn http(&self) -> &Pipeline {
        &self.pipeline
    }

    /// The navigation seam.
    #[must_use]
    pub fn navigator(&self) -> &Arc<dyn Navigator> {
        &self.navigator
    }

    /// The configuration this controller was built with.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Ingests a token and user from a completed login call.
    ///
    /// No network: the token was already issued by a prior API call. The
    /// display image prefers a decoded-token claim over the supplied user
    /// fields and is cached for the next reload.
    pub fn login(&self, token: &str, user: User) {
        self.session.token().set(token);

        let image = picture_claim(token).or_else(|| user.picture().map(ToOwned::to_owned));
        if let Some(image) = image {
            self.storage.set(PROFILE_IMAGE_KEY, &image);
        }

        info!("logged in as {}", user.display_name());
        *self.lock() = SessionState {
            is_authenticated: true,
            user: Some(user),
            is_loading: false,
            error: None,
        };
    }

    /// Tears the session down and redirects to the login route.
    ///
    /// Suppression is raised before the remote call so no concurrent
    /// refresh races the teardown. The remote logout is best-effort; its
    /// failure is logged and local cleanup proceeds regardless, so logout
    /// always "succeeds" from the client's perspective.
    pub async fn logout(&self) {
        self.session.set_suppressed(true);
        self.lock().is_loading = true;

        match self.config.logout_url() {
            Ok(url) => {
                let request = self.pipeline.client().post(url);
                match self.pipeline.execute(request).await {
                    Ok(response) if response.status().is_success() => {
                        debug!("remote logout acknowledged");
                    }
                    Ok(response) => warn!("remote logout returned {}", response.status()),
                    Err(e) => warn!("remote logout failed: {e}"),
                }
            }
            Err(e) => warn!("remote logout skipped: {e}"),
        }

        // Both branches converge here: full local wipe, then redirect.
        self.session.token().clear();
        self.storage.remove(PROFILE_IMAGE_KEY);
        self.storage.clear();
        *self.lock() = SessionState::logged_out();
        self.navigator.navigate(self.config.routes.login_route());
    }

    /// Establishes the session for the current path, on mount or path
    /// change.
    ///
    /// Unprotected paths stop loading and make no guesses. Protected
    /// paths without an in-memory token get one silent refresh; if that
    /// fails the state becomes fully logged out, with no redirect (the
    /// route guard decides that). With a token in hand the current
    /// profile is fetched, role-sensitively: admin-prefixed paths use the
    /// admin profile endpoint.
    ///
    /// Profile errors: 401/403 log out; 404 keeps any existing state, a
    /// missing profile sub-resource is not a logout signal; anything else
    /// stops the loading indicator and leaves prior state untouched.
    pub async fn initialize(&self, path: &str) {
        if !self.config.routes.is_protected(path) {
            self.lock().is_loading = false;
            return;
        }

        if self.session.token().get().is_none() {
            self.lock().is_loading = true;
            if !self.coordinator.attempt_silent().await {
                *self.lock() = SessionState::logged_out();
                return;
            }
        }

        match self.fetch_profile(path).await {
            Ok(user) => {
                if let Some(picture) = user.picture() {
                    self.storage.set(PROFILE_IMAGE_KEY, picture);
                }
                self.set_authenticated(user);
            }
            Err(e) => match e.kind {
                ErrorKind::Unauthenticated | ErrorKind::PermissionDenied => {
                    debug!("profile fetch rejected: {e}");
                    *self.lock() = SessionState::logged_out();
                }
                ErrorKind::NotFound => {
                    // A missing profile sub-resource is a data hiccup,
                    // not a logout signal; logging out here would start
                    // a redirect loop.
                    debug!("profile not found, keeping session state");
                    self.lock().is_loading = false;
                }
                _ => {
                    warn!("profile fetch failed: {e}");
                    self.lock().is_loading = false;
                }
            },
        }
    }

    async fn fetch_profile(&self, path: &str) -> Result<User> {
        let admin = self.config.routes.is_admin(path);
        let url = self.config.profile_url(admin)?;

        let request = self.pipeline.client().get(url);
        let response = self.pipeline.execute(request).await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::from_status(status, "profile fetch"));
        }

        let body = response.text().await.map_err(Error::from)?;
        let parsed: ProfileResponse = protocol::json(&body, "profile")?;
        parsed
            .into_user()
            .ok_or_else(|| Error::internal("profile payload not well-formed"))
    }

    /// Marks the session authenticated, upholding the state invariant:
    /// if the token vanished while the profile fetch was in flight (a
    /// concurrent logout), the logged-out state wins.
    fn set_authenticated(&self, user: User) {
        if !self.session.token().is_set() {
            debug!("token cleared during profile fetch, staying logged out");
            *self.lock() = SessionState::logged_out();
            return;
        }

        *self.lock() = SessionState {
            is_authenticated: true,
            user: Some(user),
            is_loading: false,
            error: None,
        };
    }
}
