//! Common utilities for the Lumen renderer.
//!
//! This crate provides shared infrastructure used by all renderer components:
//! - **Warning System** - deduplicated terminal output for recovered problems
//!   (malformed style values, unbalanced style scopes)

pub mod warning;
