//! Wire types for the CMS authentication endpoints.
//!
//! # Submodules
//!
//! * [`auth`] - refresh/login response shapes and bearer-token claim peeking
//! * [`profile`] - the current-user profile payload
//!
//! # Shared Functionality
//!
//! The module provides [`json`], the common parse-and-log helper: responses
//! are logged at TRACE level when they parse, and the raw body is surfaced
//! for debugging when they do not. Payloads that carry tokens redact them
//! in their `Debug` output, so tracing a response never leaks credentials.

pub mod auth;
pub mod profile;

use crate::error::Result;
use serde::Deserialize;
use std::fmt::Debug;

/// Parses and logs a JSON response body.
///
/// # Arguments
///
/// * `body` - Response body text to parse
/// * `origin` - Description of the endpoint for logging
///
/// # Errors
///
/// Returns error if the body is not valid JSON or does not match `T`.
///
/// # Logging
///
/// * Success: logs the parsed structure at TRACE level
/// * Parse error: logs the raw JSON at TRACE level if valid JSON
/// * Invalid JSON: logs the error and raw text at ERROR level
pub fn json<T>(body: &str, origin: &str) -> Result<T>
where
    T: for<'de> Deserialize<'de> + Debug,
{
    match serde_json::from_str(body) {
        Ok(result) => {
            trace!("{origin}: {result:#?}");
            Ok(result)
        }
        Err(e) => {
            if let Ok(json) = serde_json::from_str::<serde_json::Value>(body) {
                trace!("{origin}: {json:#?}");
            } else {
                error!("{origin}: failed parsing response ({e:?})");
                trace!("{body}");
            }
            Err(e.into())
        }
    }
}
