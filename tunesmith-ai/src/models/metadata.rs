//! Song metadata record returned to the UI
//!
//! Every record handed out by the generator satisfies the field constraints
//! below. Failure is signalled in-band with a sentinel record whose title is
//! [`FAILURE_TITLE`].

use serde::{Deserialize, Serialize};

/// Lowest accepted tempo
pub const MIN_BPM: u16 = 60;
/// Highest accepted tempo
pub const MAX_BPM: u16 = 180;
/// Tempo used when the generated one is missing or invalid
pub const DEFAULT_BPM: u16 = 120;
/// Key used when the generated one is missing or invalid
pub const DEFAULT_KEY_SCALE: &str = "C major";
/// Time signature used when the generated one is not allowed
pub const DEFAULT_TIME_SIGNATURE: &str = "4/4";
/// Time signatures the downstream model accepts
pub const ALLOWED_TIME_SIGNATURES: [&str; 7] = ["2/4", "3/4", "4/4", "5/4", "6/8", "7/8", "12/8"];
/// Title used when a generation omits one
pub const FALLBACK_TITLE: &str = "Untitled";
/// Reserved title marking a sentinel failure record
pub const FAILURE_TITLE: &str = "Generation Failed";
/// Section marker prepended to lyrics that have none
pub const DEFAULT_SECTION_MARKER: &str = "[Verse]\n";

const MOCK_TITLE: &str = "Neon Echoes (Mock)";
const MOCK_LYRICS: &str = "[Verse]\n\
Streetlights flicker on the wet concrete\n\
Footsteps echo where the shadows meet\n\
\n\
[Chorus]\n\
Neon echoes calling out my name\n\
Every city night just feels the same\n\
\n\
[Outro]\n\
Fading out beneath the rain";
const RETRIES_EXHAUSTED_MESSAGE: &str = "All retry attempts failed. Please try again later.";

/// Structured song metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedMetadata {
    /// Short title (1-5 words); empty for enhancements that produced none
    pub title: String,
    /// Lyrics with section markers such as `[Verse]` or `[Chorus]`
    pub lyrics: String,
    /// Style descriptors, in order
    pub tags: Vec<String>,
    /// Tempo in beats per minute
    pub bpm: u16,
    /// Key and mode, e.g. `F# minor`
    pub key_scale: String,
    /// Time signature, e.g. `6/8`
    pub time_signature: String,
}

/// Reason shown to the user inside a sentinel failure record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCause {
    Timeout,
    Credential,
    RateLimited,
    Other,
}

impl FailureCause {
    /// User-facing sentence for this cause
    pub fn message(self) -> &'static str {
        match self {
            FailureCause::Timeout => {
                "The request timed out. The model may be busy, please try again in a moment."
            }
            FailureCause::Credential => {
                "The API key is missing or invalid. Please check your Gemini API key configuration."
            }
            FailureCause::RateLimited => {
                "The API rate limit was exceeded. Please wait a little before trying again."
            }
            FailureCause::Other => "Failed to generate song metadata. Please try again.",
        }
    }
}

impl GeneratedMetadata {
    /// Record with default tempo, key and time signature
    pub fn with_defaults(title: String, lyrics: String, tags: Vec<String>) -> Self {
        Self {
            title,
            lyrics,
            tags,
            bpm: DEFAULT_BPM,
            key_scale: DEFAULT_KEY_SCALE.to_string(),
            time_signature: DEFAULT_TIME_SIGNATURE.to_string(),
        }
    }

    /// Fixed record returned when no credential is configured
    pub fn mock() -> Self {
        Self::with_defaults(
            MOCK_TITLE.to_string(),
            MOCK_LYRICS.to_string(),
            vec![
                "electronic".to_string(),
                "mock".to_string(),
                "ambient".to_string(),
            ],
        )
    }

    /// Per-attempt sentinel failure record
    pub fn failure(cause: FailureCause) -> Self {
        Self::failure_with_message(cause.message())
    }

    /// Sentinel returned once every retry attempt has failed
    pub fn retries_exhausted() -> Self {
        Self::failure_with_message(RETRIES_EXHAUSTED_MESSAGE)
    }

    fn failure_with_message(message: &str) -> Self {
        Self::with_defaults(
            FAILURE_TITLE.to_string(),
            format!("[Error]\n{}", message),
            vec!["error".to_string(), "retry".to_string(), "api".to_string()],
        )
    }

    /// Non-destructive enhancement result: the caller's own lyrics and style
    ///
    /// Used both when no credential is configured and when enhancement fails.
    /// The empty title tells the caller nothing new was generated.
    pub fn enhancement_fallback(current_style: &str, current_lyrics: &str) -> Self {
        Self::with_defaults(
            String::new(),
            current_lyrics.to_string(),
            crate::services::normalizer::split_style_tags(current_style),
        )
    }

    /// True when this is a sentinel failure record
    pub fn is_generation_failure(&self) -> bool {
        self.title == FAILURE_TITLE
    }
}
