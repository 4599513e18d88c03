// Public modules
pub mod artifact;
pub mod bundle;
pub mod config;
pub mod error;
pub mod farm;
pub mod pipeline;
pub mod poll;
pub mod process;

// Re-export common types for convenience
pub use error::{Error, ErrorCode, Result};
pub use farm::{BuildFarm, BuildHandle, BuildNumber, BuildStatus};
pub use poll::{CancelToken, PollOptions};
