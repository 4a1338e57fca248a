//! Client configuration: API origin, endpoint paths, route table and the
//! user agent presented to the CMS backend.

use url::Url;

use crate::{error::Result, routes::Routes};

/// Configuration shared by the HTTP client, refresh coordinator and session
/// controller.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Config {
    pub app_name: String,
    pub app_version: String,

    /// Origin of the CMS API, e.g. `https://api.example.com`.
    pub base_url: Url,

    /// Route table for the frontend paths this client gates.
    pub routes: Routes,

    pub user_agent: String,

    /// Endpoint paths, joined onto `base_url`.
    pub refresh_path: String,
    pub logout_path: String,
    pub profile_path: String,
    pub admin_profile_path: String,
}

impl Config {
    /// Creates a configuration for the given API origin with default
    /// endpoint paths and route table.
    ///
    /// # Panics
    ///
    /// Panics if the crate name or version would produce an invalid
    /// `User-Agent` value. These come from `Cargo.toml`, so this only
    /// trips on a broken build.
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        let app_name = env!("CARGO_PKG_NAME").to_owned();
        let app_version = env!("CARGO_PKG_VERSION").to_owned();

        // Additional `User-Agent` string checks on top of `reqwest::HeaderValue`.
        let illegal_chars = |chr| chr == '/' || chr == ';';
        if app_name.is_empty()
            || app_name.contains(illegal_chars)
            || app_version.is_empty()
            || app_version.contains(illegal_chars)
        {
            panic!("application name and/or version invalid (\"{app_name}\"; \"{app_version}\")");
        }

        let os_name = match std::env::consts::OS {
            "macos" => "osx",
            other => other,
        };
        let user_agent = format!("{app_name}/{app_version} (Rust; {os_name}; admin-client)");
        trace!("user agent: {user_agent}");

        Self {
            app_name,
            app_version,

            base_url,
            routes: Routes::default(),

            user_agent,

            refresh_path: "/auth/refresh-token".to_owned(),
            logout_path: "/auth/logout".to_owned(),
            profile_path: "/users/profile".to_owned(),
            admin_profile_path: "/admin/profile".to_owned(),
        }
    }

    /// Replaces the route table.
    #[must_use]
    pub fn with_routes(mut self, routes: Routes) -> Self {
        self.routes = routes;
        self
    }

    /// Joins an endpoint path onto the API origin.
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url.join(path).map_err(Into::into)
    }

    /// The refresh endpoint URL.
    pub fn refresh_url(&self) -> Result<Url> {
        self.endpoint(&self.refresh_path)
    }

    /// The logout endpoint URL.
    pub fn logout_url(&self) -> Result<Url> {
        self.endpoint(&self.logout_path)
    }

    /// The profile endpoint URL, role-sensitive: admin-prefixed frontend
    /// paths use the admin variant.
    pub fn profile_url(&self, admin: bool) -> Result<Url> {
        if admin {
            self.endpoint(&self.admin_profile_path)
        } else {
            self.endpoint(&self.profile_path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config::new(Url::parse("https://api.example.com").expect("valid url"))
    }

    #[test]
    fn endpoints_join_onto_origin() {
        let config = config();
        assert_eq!(
            config.refresh_url().expect("refresh url").as_str(),
            "https://api.example.com/auth/refresh-token"
        );
        assert_eq!(
            config.profile_url(true).expect("admin profile url").as_str(),
            "https://api.example.com/admin/profile"
        );
        assert_eq!(
            config.profile_url(false).expect("profile url").as_str(),
            "https://api.example.com/users/profile"
        );
    }

    #[test]
    fn user_agent_carries_crate_identity() {
        let config = config();
        assert!(config.user_agent.starts_with("authgate/"));
    }
}
