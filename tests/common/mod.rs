//! Common test infrastructure
//!
//! Tests should only import from this module, not from internal submodules.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::{MockFeedServer, MockResponse, TOKEN_ALICE};
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let feed = MockFeedServer::spawn().await;
//!     feed.respond(TOKEN_ALICE, MockResponse::actions(&["acceptance"]));
//! }
//! ```

#![allow(dead_code)]

mod constants;
mod fixtures;
mod server;

// Public API - this is what tests import
pub use constants::*;
pub use fixtures::{create_migrated_store, create_store_with_accounts};
pub use server::{MockFeedServer, MockResponse, RecordedRequest};
