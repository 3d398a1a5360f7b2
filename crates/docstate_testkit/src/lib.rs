//! # docstate Testkit
//!
//! Test utilities for docstate.
//!
//! This crate provides:
//! - Test fixtures with a manual clock shared by store and tokens
//! - Property-based test generators using proptest
//! - Stress helpers that share one handle across threads
//! - Compatibility vectors for stored members and keys
//!
//! ## Usage
//!
//! ```rust,ignore
//! use docstate_testkit::prelude::*;
//!
//! #[test]
//! fn test_with_state() {
//!     with_test_state(|t| {
//!         let doc = t.add_document(1);
//!         t.events().comment_posted(UserId::new(1), doc).unwrap();
//!     });
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod stress;
pub mod vectors;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::stress::*;
    pub use crate::vectors::*;
    pub use docstate_core::{Category, DocumentId, Identity, UserId};
}

pub use fixtures::*;
pub use generators::*;
pub use stress::*;
pub use vectors::*;
