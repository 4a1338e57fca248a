//! Client-side session and authentication gatekeeping for a CMS admin API.
//!
//! This crate implements the authentication core of an admin frontend:
//! * [`token`] - in-memory access token store, never persisted
//! * [`refresh`] - cookie-backed token refresh with single-flight deduplication
//! * [`http`] - request pipeline that attaches bearer headers and retries
//!   a request exactly once after a 401-triggered refresh
//! * [`session`] - the `{is_authenticated, user, is_loading, error}` state
//!   machine with login, logout and route-initialization transitions
//! * [`guard`] - the render/loading/redirect decision for protected routes
//!
//! Everything that touches shared state hangs off an explicitly constructed
//! [`token::SessionHandle`]; there are no module-level globals.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

#[macro_use]
extern crate log;

pub mod config;
pub mod error;
pub mod guard;
pub mod http;
pub mod navigator;
pub mod protocol;
pub mod refresh;
pub mod routes;
pub mod session;
pub mod storage;
pub mod token;
