//! Route guard: the render / loading / redirect decision.
//!
//! One guard instance gates one mounted route. It consumes the session
//! controller's state *and* reads the token store directly - defense in
//! depth against a stale `is_authenticated` left behind while another code
//! path cleared the token.
//!
//! Decision table (`effectively_authenticated` = session says so *and* a
//! token is held; rows only apply once loading has settled):
//!
//! | require_auth | effectively_authenticated | action                          |
//! |--------------|---------------------------|---------------------------------|
//! | true         | false                     | silent refresh, else redirect   |
//! | true         | true                      | render children                 |
//! | false        | true                      | redirect to the landing route   |
//! | false        | false                     | render children                 |
//!
//! While the controller is loading, the guard renders a placeholder and
//! never redirects. Redirects are latched: however many render passes
//! re-evaluate the same decision, navigation fires exactly once per guard
//! instance.

use std::{
    sync::atomic::{AtomicBool, Ordering},
    time::Duration,
};

use crate::session::SessionController;

/// What the host should render for this pass.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum GuardOutcome {
    /// Render the guarded children.
    Render,
    /// Render a loading/"Authenticating" placeholder; no redirect.
    Loading,
    /// A redirect to the contained route has been issued (at most once);
    /// render a placeholder until navigation lands.
    Redirect(String),
}

/// Gate for a single mounted route.
#[derive(Debug)]
pub struct RouteGuard {
    require_auth: bool,
    redirect_to: String,
    redirected: AtomicBool,
}

impl RouteGuard {
    /// How long to give the primary navigation before falling back to a
    /// hard navigation.
    const FALLBACK_DELAY: Duration = Duration::from_millis(25);

    /// Creates a guard.
    ///
    /// `redirect_to` is where an unauthenticated user of a protected
    /// route gets sent; `None` means the configured login route.
    #[must_use]
    pub fn new(
        controller: &SessionController,
        require_auth: bool,
        redirect_to: Option<String>,
    ) -> Self {
        let redirect_to =
            redirect_to.unwrap_or_else(|| controller.config().routes.login_route().to_owned());
        Self {
            require_auth,
            redirect_to,
            redirected: AtomicBool::new(false),
        }
    }

    /// Guard for a route that requires a verified session.
    #[must_use]
    pub fn protected(controller: &SessionController) -> Self {
        Self::new(controller, true, None)
    }

    /// Guard for a route that must only be shown to unauthenticated
    /// visitors (login, signup).
    #[must_use]
    pub fn public(controller: &SessionController) -> Self {
        Self::new(controller, false, None)
    }

    /// Evaluates the decision table for one render pass.
    ///
    /// May attempt one silent refresh and may issue (at most once per
    /// guard) a redirect via the controller's navigator.
    pub async fn evaluate(&self, controller: &SessionController) -> GuardOutcome {
        let state = controller.snapshot();
        if state.is_loading {
            return GuardOutcome::Loading;
        }

        // The double check: session state and token store are written by
        // different code paths and can transiently disagree.
        let effectively_authenticated =
            state.is_authenticated && controller.session().token().is_set();

        match (self.require_auth, effectively_authenticated) {
            (true, true) | (false, false) => GuardOutcome::Render,

            (true, false) => {
                if controller.coordinator().attempt_silent().await {
                    // The controller's next initialization pass picks the
                    // fresh token up; render a placeholder meanwhile.
                    GuardOutcome::Loading
                } else {
                    self.redirect(controller, &self.redirect_to).await;
                    GuardOutcome::Redirect(self.redirect_to.clone())
                }
            }

            (false, true) => {
                let landing = controller.config().routes.landing_route().to_owned();
                self.redirect(controller, &landing).await;
                GuardOutcome::Redirect(landing)
            }
        }
    }

    /// Issues the redirect, at most once per guard instance.
    ///
    /// Primary navigation first; if the location has not changed after a
    /// short delay, a hard navigation fallback fires. The latch covers
    /// both, so overlapping render passes never double-navigate.
    async fn redirect(&self, controller: &SessionController, target: &str) {
        if self.redirected.swap(true, Ordering::SeqCst) {
            trace!("redirect to {target} already issued");
            return;
        }

        let navigator = controller.navigator();
        debug!("redirecting to {target}");
        navigator.navigate(target);

        tokio::time::sleep(Self::FALLBACK_DELAY).await;
        if navigator.location() != target {
            debug!("primary navigation to {target} did not land, forcing");
            navigator.force_navigate(target);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use url::Url;

    use super::*;
    use crate::{
        config::Config,
        navigator::RecordingNavigator,
        protocol::profile::User,
        storage::MemoryStorage,
    };

    fn controller() -> SessionController {
        let config = Config::new(Url::parse("https://api.invalid").expect("url"));
        SessionController::new(
            config,
            Arc::new(MemoryStorage::new()),
            Arc::new(RecordingNavigator::new()),
        )
        .expect("controller")
    }

    fn user() -> User {
        serde_json::from_str(r#"{"id":"1","email":"admin@example.com","role":"ADMIN"}"#)
            .expect("user")
    }

    #[tokio::test]
    async fn loading_state_renders_placeholder() {
        let controller = controller();
        let guard = RouteGuard::protected(&controller);
        // Default state is loading until initialization settles.
        assert_eq!(guard.evaluate(&controller).await, GuardOutcome::Loading);
    }

    #[tokio::test]
    async fn authenticated_protected_route_renders() {
        let controller = controller();
        controller.login("token-1", user());

        let guard = RouteGuard::protected(&controller);
        assert_eq!(guard.evaluate(&controller).await, GuardOutcome::Render);
    }

    #[tokio::test]
    async fn unauthenticated_public_route_renders() {
        let controller = controller();
        controller.initialize("/auth/login").await;

        let guard = RouteGuard::public(&controller);
        assert_eq!(guard.evaluate(&controller).await, GuardOutcome::Render);
    }

    #[tokio::test]
    async fn stale_session_state_fails_the_double_check() {
        let controller = controller();
        controller.login("token-1", user());
        // Another code path cleared the token; session state is stale.
        controller.session().token().clear();
        // Suppress so the guard's silent refresh fails fast without
        // touching the network.
        controller.session().set_suppressed(true);

        let guard = RouteGuard::protected(&controller);
        assert_eq!(
            guard.evaluate(&controller).await,
            GuardOutcome::Redirect("/auth/login".to_owned())
        );
    }
}
