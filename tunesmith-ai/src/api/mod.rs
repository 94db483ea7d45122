//! HTTP API handlers for tunesmith-ai

pub mod health;
pub mod metadata;
pub mod models;

pub use health::health_routes;
pub use metadata::metadata_routes;
pub use models::model_routes;
