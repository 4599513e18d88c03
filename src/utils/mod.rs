//! Generic utility primitives with zero domain knowledge.
//!
//! - `kv` - key=value pair parsing for CLI property flags
//! - `paths` - user-facing path expansion

pub mod kv;
pub mod paths;
