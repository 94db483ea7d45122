//! # Tunesmith Common Library
//!
//! Shared code for the Tunesmith crates:
//! - Error types
//! - Bootstrap configuration (TOML + environment)
//! - Credential resolution for the generation endpoint
//! - Logging initialisation

pub mod config;
pub mod error;
pub mod logging;

pub use error::{Error, Result};
