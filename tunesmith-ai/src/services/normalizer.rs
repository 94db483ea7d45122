//! Response parsing and field normalisation
//!
//! The model's JSON is untrusted. It is first parsed into a loosely typed
//! [`RawMetadata`] (wrong field types never fail the parse), then either
//! validated strictly ([`validate`]) or normalised ([`normalize`]), which
//! substitutes a safe default for every invalid field.
//!
//! Normalising an already normalised record is a no-op.

use crate::models::metadata::{
    GeneratedMetadata, ALLOWED_TIME_SIGNATURES, DEFAULT_BPM, DEFAULT_KEY_SCALE,
    DEFAULT_SECTION_MARKER, DEFAULT_TIME_SIGNATURE, FALLBACK_TITLE, MAX_BPM, MIN_BPM,
};
use crate::services::gemini_client::GenerationError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;

/// Longest title kept, in words
pub const MAX_TITLE_WORDS: usize = 5;

static KEY_SCALE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[A-G][#b]?\s*(major|minor)$").expect("key scale pattern is valid")
});

/// Loosely typed response object
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RawMetadata {
    pub title: Option<Value>,
    pub lyrics: Option<Value>,
    /// Comma-separated style description
    pub style: Option<Value>,
    /// Legacy tag array, used only when `style` is absent
    pub tags: Option<Value>,
    pub bpm: Option<Value>,
    #[serde(rename = "keyScale")]
    pub key_scale: Option<Value>,
    #[serde(rename = "timeSignature")]
    pub time_signature: Option<Value>,
}

impl From<&GeneratedMetadata> for RawMetadata {
    fn from(record: &GeneratedMetadata) -> Self {
        Self {
            title: Some(Value::from(record.title.clone())),
            lyrics: Some(Value::from(record.lyrics.clone())),
            style: None,
            tags: Some(Value::from(record.tags.clone())),
            bpm: Some(Value::from(record.bpm)),
            key_scale: Some(Value::from(record.key_scale.clone())),
            time_signature: Some(Value::from(record.time_signature.clone())),
        }
    }
}

/// Whether an empty title is acceptable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitlePolicy {
    /// Missing titles become [`FALLBACK_TITLE`]
    Required,
    /// Missing titles stay empty ("not yet titled")
    AllowEmpty,
}

/// A field the model got wrong
#[derive(Debug, Clone, PartialEq)]
pub enum FieldViolation {
    Missing(&'static str),
    WrongType { field: &'static str, found: Value },
    TitleTooLong(usize),
    LyricsWithoutSections,
    BpmOutOfRange(Value),
    InvalidKeyScale(String),
    InvalidTimeSignature(String),
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldViolation::Missing(field) => write!(f, "{} is missing", field),
            FieldViolation::WrongType { field, found } => {
                write!(f, "{} has unexpected value {}", field, found)
            }
            FieldViolation::TitleTooLong(words) => {
                write!(f, "title has {} words (max {})", words, MAX_TITLE_WORDS)
            }
            FieldViolation::LyricsWithoutSections => write!(f, "lyrics have no section markers"),
            FieldViolation::BpmOutOfRange(value) => {
                write!(f, "bpm {} is not an integer in {}-{}", value, MIN_BPM, MAX_BPM)
            }
            FieldViolation::InvalidKeyScale(value) => write!(f, "keyScale '{}' is invalid", value),
            FieldViolation::InvalidTimeSignature(value) => {
                write!(f, "timeSignature '{}' is not allowed", value)
            }
        }
    }
}

/// Parse the response body into a raw record
///
/// Tolerates a Markdown code fence around the JSON.
pub fn parse_response(text: &str) -> Result<RawMetadata, GenerationError> {
    let body = strip_code_fence(text.trim());
    if body.is_empty() {
        return Err(GenerationError::NoResponse);
    }

    let value: Value =
        serde_json::from_str(body).map_err(|e| GenerationError::Malformed(e.to_string()))?;
    if !value.is_object() {
        return Err(GenerationError::Malformed(format!(
            "expected a JSON object, got {}",
            json_kind(&value)
        )));
    }

    serde_json::from_value(value).map_err(|e| GenerationError::Malformed(e.to_string()))
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Info string ("json", "JSON", ...) runs to the end of the opening line
    let rest = match rest.split_once('\n') {
        Some((info, body)) if !info.trim_start().starts_with(['{', '[']) => body,
        _ => rest,
    };
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Strict check: a fully typed record, or every violation found
pub fn validate(
    raw: &RawMetadata,
    policy: TitlePolicy,
) -> Result<GeneratedMetadata, Vec<FieldViolation>> {
    let title = check_title(raw.title.as_ref(), policy);
    let lyrics = check_lyrics(raw.lyrics.as_ref());
    let tags = check_tags(raw.style.as_ref(), raw.tags.as_ref());
    let bpm = check_bpm(raw.bpm.as_ref());
    let key_scale = check_key_scale(raw.key_scale.as_ref());
    let time_signature = check_time_signature(raw.time_signature.as_ref());

    match (title, lyrics, tags, bpm, key_scale, time_signature) {
        (Ok(title), Ok(lyrics), Ok(tags), Ok(bpm), Ok(key_scale), Ok(time_signature)) => {
            Ok(GeneratedMetadata {
                title,
                lyrics,
                tags,
                bpm,
                key_scale,
                time_signature,
            })
        }
        (title, lyrics, tags, bpm, key_scale, time_signature) => Err([
            title.err(),
            lyrics.err(),
            tags.err(),
            bpm.err(),
            key_scale.err(),
            time_signature.err(),
        ]
        .into_iter()
        .flatten()
        .collect()),
    }
}

/// Total normalisation: every invalid field is replaced by its default
pub fn normalize(raw: &RawMetadata, policy: TitlePolicy) -> GeneratedMetadata {
    GeneratedMetadata {
        title: normalize_title(raw.title.as_ref(), policy),
        lyrics: normalize_lyrics(raw.lyrics.as_ref()),
        tags: check_tags(raw.style.as_ref(), raw.tags.as_ref()).unwrap_or_default(),
        bpm: normalize_bpm(raw.bpm.as_ref()),
        key_scale: normalize_key_scale(raw.key_scale.as_ref()),
        time_signature: normalize_time_signature(raw.time_signature.as_ref()),
    }
}

pub fn normalize_title(value: Option<&Value>, policy: TitlePolicy) -> String {
    match check_title(value, policy) {
        Ok(title) => title,
        Err(FieldViolation::TitleTooLong(_)) => value
            .and_then(Value::as_str)
            .map(|title| first_words(title, MAX_TITLE_WORDS))
            .unwrap_or_default(),
        Err(_) => match policy {
            TitlePolicy::Required => FALLBACK_TITLE.to_string(),
            TitlePolicy::AllowEmpty => String::new(),
        },
    }
}

/// Lyrics, with `[Verse]\n` prepended when no section marker exists
pub fn normalize_lyrics(value: Option<&Value>) -> String {
    let lyrics = value.and_then(Value::as_str).unwrap_or_default();
    if lyrics.contains('[') {
        lyrics.to_string()
    } else {
        format!("{}{}", DEFAULT_SECTION_MARKER, lyrics)
    }
}

/// Integer tempo in range, else [`DEFAULT_BPM`]
pub fn normalize_bpm(value: Option<&Value>) -> u16 {
    check_bpm(value).unwrap_or(DEFAULT_BPM)
}

/// Valid key with collapsed whitespace, else [`DEFAULT_KEY_SCALE`]
pub fn normalize_key_scale(value: Option<&Value>) -> String {
    check_key_scale(value).unwrap_or_else(|_| DEFAULT_KEY_SCALE.to_string())
}

/// Allowed time signature, else [`DEFAULT_TIME_SIGNATURE`]
pub fn normalize_time_signature(value: Option<&Value>) -> String {
    check_time_signature(value).unwrap_or_else(|_| DEFAULT_TIME_SIGNATURE.to_string())
}

/// Split a comma-separated style description into tags
pub fn split_style_tags(style: &str) -> Vec<String> {
    style
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

fn first_words(text: &str, count: usize) -> String {
    text.split_whitespace()
        .take(count)
        .collect::<Vec<_>>()
        .join(" ")
}

fn check_title(value: Option<&Value>, policy: TitlePolicy) -> Result<String, FieldViolation> {
    let title = match value {
        None | Some(Value::Null) => "",
        Some(Value::String(title)) => title.trim(),
        Some(other) => {
            return Err(FieldViolation::WrongType {
                field: "title",
                found: other.clone(),
            })
        }
    };

    let words = title.split_whitespace().count();
    if words == 0 {
        return match policy {
            TitlePolicy::Required => Err(FieldViolation::Missing("title")),
            TitlePolicy::AllowEmpty => Ok(String::new()),
        };
    }
    if words > MAX_TITLE_WORDS {
        return Err(FieldViolation::TitleTooLong(words));
    }
    Ok(title.to_string())
}

fn check_lyrics(value: Option<&Value>) -> Result<String, FieldViolation> {
    match value {
        None | Some(Value::Null) => Err(FieldViolation::Missing("lyrics")),
        Some(Value::String(lyrics)) if lyrics.contains('[') => Ok(lyrics.clone()),
        Some(Value::String(_)) => Err(FieldViolation::LyricsWithoutSections),
        Some(other) => Err(FieldViolation::WrongType {
            field: "lyrics",
            found: other.clone(),
        }),
    }
}

fn check_tags(style: Option<&Value>, tags: Option<&Value>) -> Result<Vec<String>, FieldViolation> {
    match (style, tags) {
        (Some(Value::String(style)), _) => Ok(split_style_tags(style)),
        (Some(other), _) if !other.is_null() => Err(FieldViolation::WrongType {
            field: "style",
            found: other.clone(),
        }),
        (_, Some(Value::Array(items))) => Ok(items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect()),
        _ => Err(FieldViolation::Missing("style")),
    }
}

fn check_bpm(value: Option<&Value>) -> Result<u16, FieldViolation> {
    let Some(value) = value.filter(|v| !v.is_null()) else {
        return Err(FieldViolation::Missing("bpm"));
    };
    let Value::Number(number) = value else {
        return Err(FieldViolation::WrongType {
            field: "bpm",
            found: value.clone(),
        });
    };

    let integral = number.as_i64().or_else(|| {
        number
            .as_f64()
            .filter(|f| f.fract() == 0.0 && f.is_finite())
            .map(|f| f as i64)
    });

    match integral {
        Some(bpm) if (i64::from(MIN_BPM)..=i64::from(MAX_BPM)).contains(&bpm) => Ok(bpm as u16),
        _ => Err(FieldViolation::BpmOutOfRange(value.clone())),
    }
}

fn check_key_scale(value: Option<&Value>) -> Result<String, FieldViolation> {
    match value {
        None | Some(Value::Null) => Err(FieldViolation::Missing("keyScale")),
        Some(Value::String(key)) if KEY_SCALE_RE.is_match(key) => {
            Ok(key.split_whitespace().collect::<Vec<_>>().join(" "))
        }
        Some(Value::String(key)) => Err(FieldViolation::InvalidKeyScale(key.clone())),
        Some(other) => Err(FieldViolation::WrongType {
            field: "keyScale",
            found: other.clone(),
        }),
    }
}

fn check_time_signature(value: Option<&Value>) -> Result<String, FieldViolation> {
    match value {
        None | Some(Value::Null) => Err(FieldViolation::Missing("timeSignature")),
        Some(Value::String(sig)) if ALLOWED_TIME_SIGNATURES.contains(&sig.as_str()) => {
            Ok(sig.clone())
        }
        Some(Value::String(sig)) => Err(FieldViolation::InvalidTimeSignature(sig.clone())),
        Some(other) => Err(FieldViolation::WrongType {
            field: "timeSignature",
            found: other.clone(),
        }),
    }
}
