//! # LibrarySphere Library
//!
//! This library provides the core functionality for the LibrarySphere admin front-end.
//! LibrarySphere lets librarians register a library, sign in, and manage its members
//! and books. The front-end owns no data: every screen is a server-rendered form or
//! table bound to the endpoints of a remote library API.
//!
//! ## Overview
//!
//! The library is organized into several modules that handle different aspects of the application:
//!
//! - `api`: Talks to the remote library API and reports failures uniformly
//! - `config`: Handles application configuration and reloading
//! - `dashboard`: Renders the library dashboard and runs its modal operations
//! - `error`: Defines custom error types for consistent error handling
//! - `listing`: Renders the searchable members and books lists
//! - `models`: Entities exchanged with the library API
//! - `notice`: Collects user-facing notices and carries them across redirects
//! - `registration`: Renders the library registration page
//! - `server`: Runs the web server and manages routes
//! - `sign_in`: Renders the sign-in page
//! - `utils`: Provides utility functions used throughout the application
//!
//! ## Getting Started
//!
//! Start the web server with the `run` function:
//!
//! ```no_run
//! use library_sphere::{config::CONFIG_FILE, server};
//! use std::path::PathBuf;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), library_sphere::error::SphereError> {
//!     let cancel_token = CancellationToken::new();
//!     let config_path = Some(PathBuf::from(CONFIG_FILE));
//!
//!     server::run(3000, config_path, cancel_token).await
//! }
//! ```
//!
//! ## Pages
//!
//! - `/`: sign in with a library identifier and password
//! - `/CreateAnAccount`: register a new library
//! - `/Library?libraryId=…`: dashboard with add/remove member, add/remove book,
//!   lend and return modals
//! - `/ViewMembers?libraryId=…` and `/ViewBooks?libraryId=…`: searchable lists
//!
//! The library identifier travels between pages only in the URL.

/// Remote library API client
///
/// Wraps a shared `reqwest` client and exposes one method per API operation,
/// each returning an `ApiResult` so that screens handle failures the same way.
pub mod api;

/// Configuration management module
///
/// Loads settings from a JSON5 file, validates them, and reloads them when the
/// file changes so the API address can be switched without a restart.
pub mod config;

/// Library dashboard module
///
/// Holds the modal state machine and the six mutating operations.
pub mod dashboard;

/// Custom error types module
pub mod error;

/// Members and books list views
pub mod listing;

/// API entities
pub mod models;

/// User notifications
///
/// Provides the notifier capability injected into every screen and the flash
/// cookie used to show notices after a redirect.
pub mod notice;

/// Library registration page
pub mod registration;

/// Server operations module
///
/// Contains the main web server implementation using the Axum framework. This module
/// sets up routes, serves static files, and manages graceful shutdown of the server.
pub mod server;

/// Sign-in page
pub mod sign_in;

/// Utility functions module
///
/// Link building, blank-field checks, library headings and date formatting.
pub mod utils;
