//! # mp4mux Testkit
//!
//! Test utilities for mp4mux.
//!
//! This crate provides:
//! - Session fixtures with ready-made configuration and temporary
//!   input files
//! - Property-based test generators for configuration stores using
//!   proptest
//!
//! ## Usage
//!
//! ```rust,ignore
//! use mp4mux_testkit::prelude::*;
//!
//! #[test]
//! fn test_with_session() {
//!     with_session(|muxer| {
//!         muxer.run_consistency_check().unwrap();
//!     });
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use fixtures::*;
pub use generators::*;
