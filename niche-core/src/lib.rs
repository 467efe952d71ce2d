//! Niche Core - shared infrastructure for the keyword research workspace
//!
//! Errors, logging, configuration, retry policy and the data types passed
//! between the keyword, provider and research crates.

pub mod async_utils;
pub mod config;
pub mod error;
pub mod logging;
pub mod types;

pub use async_utils::*;
pub use config::*;
pub use error::*;
pub use logging::*;
pub use types::*;

// Re-export commonly used external types
pub use async_trait::async_trait;
pub use tokio;
pub use tracing;
