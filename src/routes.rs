//! Route table for the admin frontend.
//!
//! A fixed allow-list of protected path prefixes determines whether session
//! initialization attempts a silent refresh at all, and which profile
//! endpoint variant applies. Unlisted paths are unauthenticated-by-default:
//! the session layer never guesses.

/// Route table consulted by the session controller and the route guard.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Routes {
    /// Path prefixes that require a verified session.
    protected_prefixes: Vec<String>,

    /// Prefix that selects the admin variant of the profile endpoint.
    admin_prefix: String,

    /// Login entry point, the target of every unauthenticated redirect.
    login: String,

    /// Landing route for authenticated users hitting a public-only page.
    landing: String,
}

impl Default for Routes {
    fn default() -> Self {
        Self {
            protected_prefixes: ["/dashboard", "/admin", "/profile", "/settings"]
                .into_iter()
                .map(str::to_owned)
                .collect(),
            admin_prefix: "/admin".to_owned(),
            login: "/auth/login".to_owned(),
            landing: "/dashboard".to_owned(),
        }
    }
}

impl Routes {
    /// Creates a route table with custom protected prefixes.
    ///
    /// The login and landing routes keep their defaults; use the setters
    /// below to override them.
    #[must_use]
    pub fn with_protected_prefixes<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            protected_prefixes: prefixes.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Overrides the login route.
    #[must_use]
    pub fn with_login(mut self, login: impl Into<String>) -> Self {
        self.login = login.into();
        self
    }

    /// Overrides the authenticated landing route.
    #[must_use]
    pub fn with_landing(mut self, landing: impl Into<String>) -> Self {
        self.landing = landing.into();
        self
    }

    /// Whether `path` falls under a protected prefix.
    ///
    /// A prefix matches the exact path or a sub-path; `/dashboard` covers
    /// `/dashboard` and `/dashboard/users` but not `/dashboard2`.
    #[must_use]
    pub fn is_protected(&self, path: &str) -> bool {
        self.protected_prefixes
            .iter()
            .any(|prefix| Self::has_prefix(path, prefix))
    }

    /// Whether `path` falls under the admin prefix.
    ///
    /// Admin-prefixed paths use a distinct profile endpoint.
    #[must_use]
    pub fn is_admin(&self, path: &str) -> bool {
        Self::has_prefix(path, &self.admin_prefix)
    }

    /// The login entry point.
    #[must_use]
    pub fn login_route(&self) -> &str {
        &self.login
    }

    /// The authenticated landing route.
    #[must_use]
    pub fn landing_route(&self) -> &str {
        &self.landing
    }

    fn has_prefix(path: &str, prefix: &str) -> bool {
        path.strip_prefix(prefix)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_matches_exact_and_sub_paths() {
        let routes = Routes::default();
        assert!(routes.is_protected("/dashboard"));
        assert!(routes.is_protected("/dashboard/users"));
        assert!(routes.is_protected("/admin/sections/banners"));
        assert!(!routes.is_protected("/dashboard2"));
        assert!(!routes.is_protected("/auth/login"));
        assert!(!routes.is_protected("/"));
    }

    #[test]
    fn admin_prefix_selects_admin_endpoint() {
        let routes = Routes::default();
        assert!(routes.is_admin("/admin"));
        assert!(routes.is_admin("/admin/users"));
        assert!(!routes.is_admin("/administration"));
        assert!(!routes.is_admin("/dashboard"));
    }

    #[test]
    fn custom_prefixes() {
        let routes = Routes::with_protected_prefixes(["/backoffice"]).with_login("/signin");
        assert!(routes.is_protected("/backoffice/pages"));
        assert!(!routes.is_protected("/dashboard"));
        assert_eq!(routes.login_route(), "/signin");
    }
}
