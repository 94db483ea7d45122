//! Song metadata generation
//!
//! [`MetadataGenerator`] turns a creative brief into a [`GeneratedMetadata`]
//! record with one bounded-time request to a [`GenerationBackend`].
//!
//! None of the public operations fail. Errors are logged and folded into
//! records:
//! - `generate` returns a sentinel failure record (title "Generation Failed")
//! - `generate_with_retry` retries sentinels with exponential backoff
//! - `enhance` returns the caller's own lyrics and style unchanged
//!
//! Without a backend (no credential configured) the generator runs in mock
//! mode and returns fixed records after a simulated delay.

use crate::models::{GeneratedMetadata, ModelId};
use crate::services::gemini_client::{GenerationBackend, GenerationError};
use crate::services::normalizer::{normalize, parse_response, validate, TitlePolicy};
use crate::services::prompt_builder::{enhancement_prompt, generation_prompt};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, info_span, warn, Instrument};
use tunesmith_common::config::TomlConfig;
use uuid::Uuid;

/// Retries after the first attempt when the caller does not say otherwise
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// Timing knobs of the generator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// Upper bound on one backend call
    pub request_timeout: Duration,
    /// Simulated latency of a mock generation
    pub mock_delay: Duration,
    /// Simulated latency of a mock enhancement
    pub enhance_mock_delay: Duration,
    /// Wait after the first failed attempt; doubles per further failure
    pub retry_base_delay: Duration,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            mock_delay: Duration::from_millis(1500),
            enhance_mock_delay: Duration::from_millis(2000),
            retry_base_delay: Duration::from_secs(1),
        }
    }
}

impl From<&TomlConfig> for GeneratorConfig {
    fn from(config: &TomlConfig) -> Self {
        Self {
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            mock_delay: Duration::from_millis(config.mock_delay_ms),
            enhance_mock_delay: Duration::from_millis(config.enhance_mock_delay_ms),
            retry_base_delay: Duration::from_millis(config.retry_base_delay_ms),
        }
    }
}

/// Position in the retry loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptState {
    /// Running attempt `n` (0-based)
    Trying(u32),
    Success,
    ExhaustedFailure,
}

impl AttemptState {
    /// Transition after the current attempt finished
    pub fn advance(self, succeeded: bool, max_retries: u32) -> AttemptState {
        match self {
            AttemptState::Trying(_) if succeeded => AttemptState::Success,
            AttemptState::Trying(n) if n < max_retries => AttemptState::Trying(n + 1),
            AttemptState::Trying(_) => AttemptState::ExhaustedFailure,
            terminal => terminal,
        }
    }
}

/// Total calls made by generate-with-retry for a retry budget
pub fn total_attempts(max_retries: u32) -> u32 {
    max_retries.saturating_add(1)
}

/// Wait after failed attempt `attempt`: `base * 2^attempt`
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(2u32.saturating_pow(attempt))
}

/// Song metadata generator
///
/// Cheap to clone; the backend is shared and read-only.
#[derive(Clone)]
pub struct MetadataGenerator {
    backend: Option<Arc<dyn GenerationBackend>>,
    config: GeneratorConfig,
}

impl MetadataGenerator {
    /// `backend = None` selects mock mode
    pub fn new(backend: Option<Arc<dyn GenerationBackend>>, config: GeneratorConfig) -> Self {
        Self { backend, config }
    }

    pub fn is_mock(&self) -> bool {
        self.backend.is_none()
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Generate metadata for a topic and optional style
    ///
    /// Never fails: errors yield [`GeneratedMetadata::failure`].
    pub async fn generate(&self, topic: &str, style: &str, model: ModelId) -> GeneratedMetadata {
        let span = info_span!("generate", request_id = %Uuid::new_v4(), model = %model);
        async {
            let Some(backend) = &self.backend else {
                debug!(
                    delay_ms = self.config.mock_delay.as_millis() as u64,
                    "No API key configured, returning mock metadata"
                );
                sleep(self.config.mock_delay).await;
                return GeneratedMetadata::mock();
            };

            let prompt = generation_prompt(topic, style);
            match self
                .request(backend.as_ref(), model, &prompt, TitlePolicy::Required)
                .await
            {
                Ok(record) => {
                    info!(title = %record.title, bpm = record.bpm, "Metadata generated");
                    record
                }
                Err(e) => {
                    error!(error = %e, "Metadata generation failed");
                    GeneratedMetadata::failure(e.failure_cause())
                }
            }
        }
        .instrument(span)
        .await
    }

    /// [`generate`](Self::generate) with up to `max_retries` retries
    ///
    /// Attempts run strictly one after another. After failed attempt `n` the
    /// generator waits `retry_base_delay * 2^n` (1 s, 2 s, ... by default).
    /// Returns [`GeneratedMetadata::retries_exhausted`] when every attempt
    /// produced a sentinel.
    pub async fn generate_with_retry(
        &self,
        topic: &str,
        style: &str,
        model: ModelId,
        max_retries: u32,
    ) -> GeneratedMetadata {
        let mut state = AttemptState::Trying(0);

        while let AttemptState::Trying(attempt) = state {
            let record = self.generate(topic, style, model).await;
            state = state.advance(!record.is_generation_failure(), max_retries);

            match state {
                AttemptState::Success => {
                    if attempt > 0 {
                        info!(attempt, "Generation succeeded after retry");
                    }
                    return record;
                }
                AttemptState::Trying(_) => {
                    let delay = backoff_delay(self.config.retry_base_delay, attempt);
                    warn!(
                        attempt,
                        max_retries,
                        backoff_ms = delay.as_millis() as u64,
                        "Generation attempt failed, will retry after backoff"
                    );
                    sleep(delay).await;
                }
                AttemptState::ExhaustedFailure => {}
            }
        }

        error!(
            attempts = total_attempts(max_retries),
            "Generation failed: all retry attempts exhausted"
        );
        GeneratedMetadata::retries_exhausted()
    }

    /// Improve existing style and lyrics
    ///
    /// Never fails: on error the caller's lyrics and style come back unchanged
    /// with an empty title.
    pub async fn enhance(
        &self,
        current_style: &str,
        current_lyrics: &str,
        model: ModelId,
    ) -> GeneratedMetadata {
        let span = info_span!("enhance", request_id = %Uuid::new_v4(), model = %model);
        async {
            let Some(backend) = &self.backend else {
                debug!(
                    delay_ms = self.config.enhance_mock_delay.as_millis() as u64,
                    "No API key configured, echoing input"
                );
                sleep(self.config.enhance_mock_delay).await;
                return GeneratedMetadata::enhancement_fallback(current_style, current_lyrics);
            };

            let prompt = enhancement_prompt(current_style, current_lyrics);
            match self
                .request(backend.as_ref(), model, &prompt, TitlePolicy::AllowEmpty)
                .await
            {
                Ok(record) => {
                    info!(title = %record.title, tags = record.tags.len(), "Metadata enhanced");
                    record
                }
                Err(e) => {
                    error!(error = %e, "Metadata enhancement failed, keeping original input");
                    GeneratedMetadata::enhancement_fallback(current_style, current_lyrics)
                }
            }
        }
        .instrument(span)
        .await
    }

    /// One timed backend call, parsed and normalised
    async fn request(
        &self,
        backend: &dyn GenerationBackend,
        model: ModelId,
        prompt: &str,
        policy: TitlePolicy,
    ) -> Result<GeneratedMetadata, GenerationError> {
        let text = timeout(self.config.request_timeout, backend.generate_json(model, prompt))
            .await
            .map_err(|_| {
                warn!(
                    timeout_secs = self.config.request_timeout.as_secs(),
                    "Generation request abandoned after timeout"
                );
                GenerationError::Timeout
            })??;

        let raw = parse_response(&text)?;
        Ok(match validate(&raw, policy) {
            Ok(record) => record,
            Err(violations) => {
                for violation in &violations {
                    warn!(%violation, "Correcting invalid field from model response");
                }
                normalize(&raw, policy)
            }
        })
    }
}
