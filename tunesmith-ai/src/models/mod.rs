//! Data models for tunesmith-ai

pub mod metadata;
pub mod model_id;

pub use metadata::{FailureCause, GeneratedMetadata};
pub use model_id::{ModelId, ThinkingConfig, UnknownModel};
