//! Environment synthesis.
//!
//! This module builds the variable set handed to a lifecycle script:
//! - `snapshot`: the inherited process environment, captured once
//! - `synthesize`: package metadata and configuration flattened into variables
//! - `cache`: caller-owned memoization of synthesized environments
//! - `sanitize`: variable name and value normalization

pub mod cache;
pub mod sanitize;
pub mod snapshot;
pub mod synthesize;

use std::collections::BTreeMap;

pub use cache::EnvCache;
pub use sanitize::{escape_newlines, sanitize_key};
pub use snapshot::EnvSnapshot;
pub use synthesize::synthesize;

/// A flat mapping from variable name to value.
pub type Environment = BTreeMap<String, String>;
