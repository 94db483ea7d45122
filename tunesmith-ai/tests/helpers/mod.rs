//! Test Helper Utilities
//!
//! Shared utilities for testing tunesmith-ai

#![allow(dead_code, unused_imports)]

pub mod log_capture;
pub mod scripted_backend;

pub use log_capture::{capture_logs, LogCapture};
pub use scripted_backend::{
    generator_with, mock_generator, valid_response, Call, Reply, ScriptedBackend,
};
