//! Cookie-backed access token refresh with single-flight deduplication.
//!
//! Many places detect an expired token nearly simultaneously: the route
//! guard, session initialization, and any number of in-flight requests
//! bouncing off a 401. The coordinator guarantees that however many of them
//! ask for a refresh while one is outstanding, exactly one network
//! round-trip occurs and every caller observes the same outcome - success
//! hands all of them the identical new token, failure hands all of them the
//! identical error. Duplicate refresh calls racing each other could
//! otherwise invalidate each other's freshly issued tokens.
//!
//! Refresh is also where logout suppression bites: once the session handle
//! is suppressed, every attempt fails fast with
//! [`RefreshError::Suppressed`] before touching the network.
//!
//! A single failed attempt is authoritative. The coordinator never retries
//! on its own; a later navigation or request has to ask again.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::{
    future::{BoxFuture, Shared},
    FutureExt,
};
use thiserror::Error;
use url::Url;

use crate::{
    protocol::{self, auth::RefreshResponse},
    token::SessionHandle,
};

/// Refresh failure taxonomy.
///
/// Cloneable because every waiter on a shared attempt receives the same
/// error value.
#[derive(Clone, Debug, Eq, Error, Hash, PartialEq)]
pub enum RefreshError {
    /// Refresh attempted while logout is tearing the session down.
    ///
    /// Always a silent failure; never surfaced to the user.
    #[error("refresh suppressed during logout")]
    Suppressed,

    /// The remote refresh was rejected or failed on the wire.
    ///
    /// The token store has been cleared by the time this is observed.
    #[error("refresh failed: {0}")]
    Failed(String),
}

/// Refresh errors enter the crate-wide taxonomy as authentication
/// failures, except suppression which reads as a cancelled operation.
impl From<RefreshError> for crate::error::Error {
    fn from(e: RefreshError) -> Self {
        match e {
            RefreshError::Suppressed => Self::cancelled(e),
            RefreshError::Failed(_) => Self::unauthenticated(e),
        }
    }
}

type SharedAttempt = Shared<BoxFuture<'static, Result<String, RefreshError>>>;

/// Single-flight wrapper around the remote refresh endpoint.
///
/// Clones share the in-flight slot, so concurrent callers anywhere in the
/// process join the same attempt.
#[derive(Clone, Debug)]
pub struct RefreshCoordinator {
    http: reqwest::Client,
    refresh_url: Url,
    session: SessionHandle,
    in_flight: Arc<Mutex<Option<SharedAttempt>>>,
}

impl RefreshCoordinator {
    /// Creates a coordinator posting to `refresh_url` with `http`.
    ///
    /// The client must carry the cookie jar holding the refresh cookie;
    /// the refresh request itself has no body and no bearer header.
    #[must_use]
    pub fn new(http: reqwest::Client, refresh_url: Url, session: SessionHandle) -> Self {
        Self {
            http,
            refresh_url,
            session,
            in_flight: Arc::new(Mutex::new(None)),
        }
    }

    fn slot(&self) -> MutexGuard<'_, Option<SharedAttempt>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Refreshes the access token, joining any attempt already in flight.
    ///
    /// On success the new token has been written into the token store
    /// before any waiter resolves; on failure the store has been cleared.
    pub async fn refresh(&self) -> Result<String, RefreshError> {
        if self.session.is_suppressed() {
            debug!("refresh suppressed, failing fast");
            return Err(RefreshError::Suppressed);
        }

        let attempt = {
            let mut slot = self.slot();
            if let Some(attempt) = slot.as_ref() {
                trace!("joining in-flight refresh");
                attempt.clone()
            } else {
                let attempt = Self::run(
                    self.http.clone(),
                    self.refresh_url.clone(),
                    self.session.clone(),
                )
                .boxed()
                .shared();
                *slot = Some(attempt.clone());
                attempt
            }
        };

        let result = attempt.clone().await;

        // Release the slot so a later caller starts a fresh attempt. Only
        // the attempt we awaited may be cleared; a newer one stays.
        let mut slot = self.slot();
        if slot.as_ref().is_some_and(|current| current.ptr_eq(&attempt)) {
            *slot = None;
        }

        result
    }

    /// Silent refresh for route-level checks.
    ///
    /// Swallows every error, including suppression, and reports only
    /// whether a new token was obtained.
    pub async fn attempt_silent(&self) -> bool {
        match self.refresh().await {
            Ok(_) => true,
            Err(RefreshError::Suppressed) => false,
            Err(e) => {
                debug!("silent refresh failed: {e}");
                false
            }
        }
    }

    /// Toggles refresh suppression on the underlying session handle.
    ///
    /// Set by the logout path before the remote logout call, so no
    /// concurrent refresh races the teardown.
    pub fn set_suppressed(&self, suppressed: bool) {
        self.session.set_suppressed(suppressed);
    }

    /// The one real network round-trip behind a shared attempt.
    async fn run(
        http: reqwest::Client,
        refresh_url: Url,
        session: SessionHandle,
    ) -> Result<String, RefreshError> {
        let result = Self::request_token(&http, refresh_url).await;
        match result {
            Ok(token) => {
                session.token().set(token.clone());
                debug!("access token refreshed");
                Ok(token)
            }
            Err(e) => {
                // A failed refresh is authoritative: whatever token we
                // held is no longer trusted.
                session.token().clear();
                warn!("{e}");
                Err(e)
            }
        }
    }

    async fn request_token(http: &reqwest::Client, refresh_url: Url) -> Result<String, RefreshError> {
        // Credentials ride in the cookie jar; the request body is empty.
        let response = http
            .post(refresh_url)
            .send()
            .await
            .map_err(|e| RefreshError::Failed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RefreshError::Failed(format!(
                "refresh endpoint returned {status}"
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| RefreshError::Failed(e.to_string()))?;
        let parsed: RefreshResponse = protocol::json(&body, "refresh")
            .map_err(|e| RefreshError::Failed(e.to_string()))?;

        if parsed.access_token.is_empty() {
            return Err(RefreshError::Failed(
                "refresh endpoint returned an empty token".to_owned(),
            ));
        }

        Ok(parsed.access_token)
    }
}
