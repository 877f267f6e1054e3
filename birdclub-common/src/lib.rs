//! # Birdclub Common Library
//!
//! Shared code for the birdclub service and its tooling:
//! - Database models and schema initialization
//! - Configuration loading and root folder resolution
//! - Typed session cache for feed snapshots
//! - Feed timestamp parsing

pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod time;

pub use cache::{CacheDomain, SessionCache};
pub use error::{Error, Result};
