//! # Chain-Historian Test Suite
//!
//! Cross-subsystem integration tests over the in-memory adapters.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── support.rs        # Shared fixtures: pipeline assembly, stubs
//! │
//! └── integration/      # Cross-subsystem flows
//!     ├── pipeline.rs   # trace stream -> store, retries, fan-out
//!     ├── caching.rs    # engine reuse, invalidation, ranges
//!     └── matcher.rs    # dependent-key matching against the store
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p historian-tests
//!
//! # By flow
//! cargo test -p historian-tests integration::pipeline
//! cargo test -p historian-tests integration::caching
//! ```

#![allow(dead_code)]

pub mod integration;
pub mod support;
