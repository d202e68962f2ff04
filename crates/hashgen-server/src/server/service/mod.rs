//! HTTP service implementation.
//!
//! This module contains the request handlers and the mapping from failures to
//! HTTP responses. The digest work itself lives in the `hashgen` crate.
//!
//! ## Structure
//!
//! - [`handler`] - axum routes and the shared [`handler::HashService`].
//! - [`error`] - [`error::ApiError`] and its `{"status":"failed"}` rendering.

pub mod error;
pub mod handler;
