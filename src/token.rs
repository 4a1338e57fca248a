//! In-memory access token storage.
//!
//! The access token is an opaque bearer string issued by the login or
//! refresh endpoints. It lives only in process memory - never in cookies,
//! local storage or on disk - so a full reload starts unauthenticated until
//! a refresh succeeds against the server-held refresh cookie.
//!
//! [`SessionHandle`] bundles the token store with the logout suppression
//! flag. It is constructed explicitly and injected wherever shared session
//! state is needed; there are no module-level globals, and a fresh handle
//! resets all of it (which is what makes tests hermetic).

use std::{
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, MutexGuard, PoisonError,
    },
};

use reqwest::header::HeaderValue;

/// Shared, in-memory holder for the current access token.
///
/// Cloning yields another handle onto the same token. Writers are the
/// refresh coordinator and the session controller's login/logout paths;
/// everything else only reads (except the interceptor clearing it on a
/// hard 403).
#[derive(Clone, Default)]
pub struct TokenStore {
    inner: Arc<Mutex<Option<String>>>,
}

impl TokenStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Option<String>> {
        // A poisoned token slot is still just a token slot.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stores a token, overwriting any previous value.
    ///
    /// No validation is performed; the caller trusts the server-issued
    /// bearer value.
    pub fn set(&self, token: impl Into<String>) {
        *self.lock() = Some(token.into());
    }

    /// Returns the current token, or `None` if never set or cleared.
    #[must_use]
    pub fn get(&self) -> Option<String> {
        self.lock().clone()
    }

    /// Whether a token is currently held.
    #[must_use]
    pub fn is_set(&self) -> bool {
        self.lock().is_some()
    }

    /// Resets the store to empty.
    ///
    /// Used on logout and on unrecoverable refresh failure.
    pub fn clear(&self) {
        *self.lock() = None;
    }

    /// Derives the `Authorization` header for the current token.
    ///
    /// Returns `None` when no token is held, or when the token cannot be
    /// represented as a header value (which a server-issued bearer string
    /// never should be; such a token is dropped with a warning).
    #[must_use]
    pub fn authorization_header(&self) -> Option<HeaderValue> {
        let token = self.get()?;
        match HeaderValue::from_str(&format!("Bearer {token}")) {
            Ok(mut header) => {
                header.set_sensitive(true);
                Some(header)
            }
            Err(e) => {
                warn!("access token is not a valid header value: {e}");
                None
            }
        }
    }
}

/// Never log the token itself.
impl fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenStore")
            .field("token", &self.is_set().then_some("[REDACTED]"))
            .finish()
    }
}

/// The injected session state: token store plus logout suppression flag.
///
/// The suppression flag is set at the start of logout and never cleared
/// within this handle's lifetime; while set, every refresh attempt fails
/// fast without a network call. Constructing a fresh handle (a "new page
/// load") resets it.
#[derive(Clone, Debug, Default)]
pub struct SessionHandle {
    token: TokenStore,
    suppressed: Arc<AtomicBool>,
}

impl SessionHandle {
    /// Creates a fresh, unauthenticated session handle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The shared token store.
    #[must_use]
    pub fn token(&self) -> &TokenStore {
        &self.token
    }

    /// Toggles refresh suppression.
    ///
    /// Only the logout path sets this; nothing clears it again within the
    /// same handle.
    pub fn set_suppressed(&self, suppressed: bool) {
        self.suppressed.store(suppressed, Ordering::SeqCst);
    }

    /// Whether refresh attempts are currently suppressed.
    #[must_use]
    pub fn is_suppressed(&self) -> bool {
        self.suppressed.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_clear() {
        let store = TokenStore::new();
        assert_eq!(store.get(), None);

        store.set("abc");
        assert_eq!(store.get(), Some("abc".to_owned()));

        store.set("def");
        assert_eq!(store.get(), Some("def".to_owned()));

        store.clear();
        assert_eq!(store.get(), None);
    }

    #[test]
    fn authorization_header_derivation() {
        let store = TokenStore::new();
        assert!(store.authorization_header().is_none());

        store.set("abc123");
        let header = store.authorization_header().expect("header");
        assert_eq!(header.to_str().expect("ascii"), "Bearer abc123");
        assert!(header.is_sensitive());
    }

    #[test]
    fn clones_share_state() {
        let store = TokenStore::new();
        let other = store.clone();
        store.set("shared");
        assert_eq!(other.get(), Some("shared".to_owned()));
    }

    #[test]
    fn debug_never_leaks_token() {
        let store = TokenStore::new();
        store.set("super-secret");
        assert!(!format!("{store:?}").contains("super-secret"));
    }

    #[test]
    fn suppression_flag() {
        let session = SessionHandle::new();
        assert!(!session.is_suppressed());

        session.set_suppressed(true);
        assert!(session.is_suppressed());

        // Clones observe the same flag.
        assert!(session.clone().is_suppressed());
    }
}
