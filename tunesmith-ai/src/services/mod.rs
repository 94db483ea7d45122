//! Generation services

pub mod gemini_client;
pub mod metadata_generator;
pub mod normalizer;
pub mod prompt_builder;

pub use gemini_client::{GeminiClient, GenerationBackend, GenerationError};
pub use metadata_generator::{
    backoff_delay, total_attempts, AttemptState, GeneratorConfig, MetadataGenerator,
    DEFAULT_MAX_RETRIES,
};
pub use normalizer::{normalize, parse_response, validate, FieldViolation, RawMetadata, TitlePolicy};
