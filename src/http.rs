//! HTTP client and interceptor pipeline for the CMS API.
//!
//! This module provides a wrapper around `reqwest::Client` that adds:
//! * Request rate limiting to respect the API's quotas
//! * Cookie management, so the server-held refresh cookie rides along
//! * Consistent timeouts and headers
//!
//! On top of the client sits the [`Pipeline`], which every outgoing API
//! call passes through:
//! * Request phase: attach the `Authorization` header when a token is held
//! * Response phase: a 401 triggers one refresh-and-resend of the same
//!   request, exactly once; a 403 is a hard authorization failure that
//!   tears the local session down and navigates to the login route; every
//!   other status passes through unchanged
//!
//! The at-most-one-retry invariant prevents infinite 401 -> refresh -> 401
//! loops when the server keeps rejecting renewed tokens. Retry bookkeeping
//! is local to [`Pipeline::execute`]; caller-owned request state is never
//! mutated.

use std::{num::NonZeroU32, sync::Arc, time::Duration};

use governor::{DefaultDirectRateLimiter, Quota};
use reqwest::{
    self,
    header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Method, StatusCode, Url,
};

use crate::{
    config::Config,
    error::{Error, Result},
    navigator::Navigator,
    refresh::RefreshCoordinator,
    storage::ClientStorage,
    token::SessionHandle,
};

/// HTTP client with built-in rate limiting and cookie support.
pub struct Client {
    /// Unlimited request client for special cases.
    ///
    /// Direct access to the underlying client without rate limiting; the
    /// refresh coordinator uses a clone of this so a refresh is never
    /// queued behind the very requests waiting on it.
    pub unlimited: reqwest::Client,

    /// Rate limiter for API quota compliance.
    rate_limiter: DefaultDirectRateLimiter,
}

impl Client {
    /// Rolling window over which the API enforces its call quota.
    const RATE_LIMIT_INTERVAL: Duration = Duration::from_secs(5);

    /// Maximum allowed API calls per interval.
    ///
    /// Requests beyond this limit are automatically delayed.
    const RATE_LIMIT_CALLS_PER_INTERVAL: u8 = 50;

    /// Duration to keep idle connections alive.
    ///
    /// Prevents frequent reconnection overhead for subsequent requests.
    const KEEPALIVE_TIMEOUT: Duration = Duration::from_secs(60);

    /// Duration to wait for individual network reads.
    const READ_TIMEOUT: Duration = Duration::from_secs(5);

    /// Total deadline for a single request.
    ///
    /// The source system had no explicit timeout policy; this bound keeps
    /// a hung refresh or profile fetch from blocking the UI forever.
    const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

    /// Creates a new client with a cookie jar.
    ///
    /// The jar is what carries the refresh cookie between the login
    /// response and later refresh calls.
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client creation fails.
    ///
    /// # Panics
    ///
    /// Panics if rate limit parameters are zero.
    pub fn new(config: &Config) -> Result<Self> {
        let cookie_jar = Arc::new(reqwest::cookie::Jar::default());

        let http_client = reqwest::Client::builder()
            .cookie_provider(cookie_jar)
            .tcp_keepalive(Self::KEEPALIVE_TIMEOUT)
            .read_timeout(Self::READ_TIMEOUT)
            .timeout(Self::REQUEST_TIMEOUT)
            .user_agent(&config.user_agent);

        let replenish_interval =
            Self::RATE_LIMIT_INTERVAL / u32::from(Self::RATE_LIMIT_CALLS_PER_INTERVAL);
        let quota = Quota::with_period(replenish_interval)
            .expect("quota time interval is zero")
            .allow_burst(
                NonZeroU32::new(Self::RATE_LIMIT_CALLS_PER_INTERVAL.into())
                    .expect("calls per interval is zero"),
            );

        Ok(Self {
            unlimited: http_client.build()?,
            rate_limiter: governor::RateLimiter::direct(quota),
        })
    }

    /// Builds a request with the specified method and URL.
    ///
    /// The body stays empty; the authentication endpoints take their
    /// credentials from cookies and headers.
    #[must_use]
    pub fn request(&self, method: Method, url: Url) -> reqwest::Request {
        let mut request = reqwest::Request::new(method, url);
        request
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        request
    }

    /// Builds a POST request.
    #[must_use]
    pub fn post(&self, url: Url) -> reqwest::Request {
        self.request(Method::POST, url)
    }

    /// Builds a GET request.
    #[must_use]
    pub fn get(&self, url: Url) -> reqwest::Request {
        self.request(Method::GET, url)
    }

    /// Executes a request with rate limiting.
    ///
    /// Applies rate limiting before executing the request to comply with
    /// API quotas.
    pub async fn perform(&self, request: reqwest::Request) -> Result<reqwest::Response> {
        // No need to await with jitter because the level of concurrency is low.
        self.rate_limiter.until_ready().await;
        self.unlimited.execute(request).await.map_err(Into::into)
    }
}

/// The interceptor pipeline wrapping every outgoing API call.
///
/// Cloning is cheap; clones share the client, coordinator and session.
#[derive(Clone)]
pub struct Pipeline {
    client: Arc<Client>,
    coordinator: RefreshCoordinator,
    session: SessionHandle,
    storage: Arc<dyn ClientStorage>,
    navigator: Arc<dyn Navigator>,
    login_route: String,
}

impl Pipeline {
    /// Assembles the pipeline from its collaborators.
    #[must_use]
    pub fn new(
        client: Arc<Client>,
        coordinator: RefreshCoordinator,
        session: SessionHandle,
        storage: Arc<dyn ClientStorage>,
        navigator: Arc<dyn Navigator>,
        login_route: impl Into<String>,
    ) -> Self {
        Self {
            client,
            coordinator,
            session,
            storage,
            navigator,
            login_route: login_route.into(),
        }
    }

    /// The underlying rate-limited client, for building requests.
    #[must_use]
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Executes a request through the interceptor pipeline.
    ///
    /// Attaches the bearer header, then applies the response policy: one
    /// refresh-and-resend on 401, hard teardown on 403, pass-through for
    /// everything else (including a second 401, which surfaces to the
    /// caller as a normal rejected response).
    ///
    /// # Errors
    ///
    /// Returns error if the transport fails, if a 401-triggered refresh
    /// fails (the refresh error propagates; the request is not resent), or
    /// with `PermissionDenied` after a 403 teardown.
    pub async fn execute(&self, request: reqwest::Request) -> Result<reqwest::Response> {
        let mut request = request;
        let mut retried = false;

        loop {
            // Taken before the send consumes the request; bodies in this
            // crate are empty or buffered, so this only fails for caller
            // supplied streaming bodies, which cannot be replayed anyway.
            let replay = request.try_clone();

            if let Some(header) = self.session.token().authorization_header() {
                request.headers_mut().insert(AUTHORIZATION, header);
            }

            let response = self.client.perform(request).await?;
            let status = response.status();

            if status == StatusCode::FORBIDDEN {
                // Hard stop: no refresh attempt for 403, ever.
                warn!("request forbidden, tearing down local session");
                self.teardown();
                return Err(Error::from_status(status, "request rejected"));
            }

            if status == StatusCode::UNAUTHORIZED && !retried {
                let Some(replay) = replay else {
                    debug!("401 response but request cannot be replayed");
                    return Ok(response);
                };

                retried = true;
                self.coordinator.refresh().await?;
                debug!("resending request after refresh");
                request = replay;
                continue;
            }

            return Ok(response);
        }
    }

    /// Clears every local session artifact and forces navigation to the
    /// login entry point.
    fn teardown(&self) {
        self.session.token().clear();
        self.storage.clear();
        self.navigator.force_navigate(&self.login_route);
    }
}
