//! In-process generation backend with scripted replies

use async_trait::async_trait;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use tunesmith_ai::models::ModelId;
use tunesmith_ai::services::{
    GenerationBackend, GenerationError, GeneratorConfig, MetadataGenerator,
};

/// What the backend does on one call
pub enum Reply {
    /// Return this text as the model answer
    Text(String),
    /// Fail with this error
    Fail(GenerationError),
    /// Sleep, then answer with [`valid_response`]
    Hang(Duration),
}

/// One recorded call
#[derive(Debug, Clone)]
pub struct Call {
    pub model: ModelId,
    pub prompt: String,
    pub at: Instant,
}

/// Backend answering from a queue of [`Reply`] values
///
/// Once the queue is empty every call fails with a network error.
#[derive(Default)]
pub struct ScriptedBackend {
    replies: Mutex<VecDeque<Reply>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedBackend {
    pub fn new(replies: Vec<Reply>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Gaps between consecutive call start times
    pub fn gaps(&self) -> Vec<Duration> {
        self.calls()
            .windows(2)
            .map(|pair| pair[1].at - pair[0].at)
            .collect()
    }
}

#[async_trait]
impl GenerationBackend for ScriptedBackend {
    async fn generate_json(&self, model: ModelId, prompt: &str) -> Result<String, GenerationError> {
        self.calls.lock().unwrap().push(Call {
            model,
            prompt: prompt.to_string(),
            at: Instant::now(),
        });

        let reply = self.replies.lock().unwrap().pop_front();
        match reply {
            Some(Reply::Text(text)) => Ok(text),
            Some(Reply::Fail(error)) => Err(error),
            Some(Reply::Hang(duration)) => {
                tokio::time::sleep(duration).await;
                Ok(valid_response())
            }
            None => Err(GenerationError::Network("script exhausted".to_string())),
        }
    }
}

/// A response body that passes validation untouched
pub fn valid_response() -> String {
    json!({
        "title": "Glass Harbor Lights",
        "lyrics": "[Verse]\nHarbor lights on broken glass\n\n[Chorus]\nHold on, hold on",
        "style": "indie folk, acoustic guitar, warm male vocals, nostalgic",
        "bpm": 96,
        "keyScale": "G major",
        "timeSignature": "3/4"
    })
    .to_string()
}

/// Generator wired to `backend` with default timings
pub fn generator_with(backend: &Arc<ScriptedBackend>) -> MetadataGenerator {
    let backend: Arc<dyn GenerationBackend> = backend.clone();
    MetadataGenerator::new(Some(backend), GeneratorConfig::default())
}

/// Generator in mock mode with default timings
pub fn mock_generator() -> MetadataGenerator {
    MetadataGenerator::new(None, GeneratorConfig::default())
}
