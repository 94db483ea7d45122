//! Selectable Gemini models

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;

/// Generation model offered to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ModelId {
    #[default]
    #[serde(rename = "gemini-3-pro-preview")]
    Gemini3Pro,
    #[serde(rename = "gemini-2.5-pro")]
    Gemini25Pro,
    #[serde(rename = "gemini-2.5-flash")]
    Gemini25Flash,
}

/// How much reasoning the model may spend before answering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThinkingConfig {
    /// Named effort level (Gemini 3 family)
    Level(&'static str),
    /// Token budget; -1 lets the model decide (Gemini 2.5 family)
    Budget(i32),
}

impl ThinkingConfig {
    /// `generationConfig.thinkingConfig` request object
    pub fn to_json(self) -> Value {
        match self {
            ThinkingConfig::Level(level) => json!({ "thinkingLevel": level }),
            ThinkingConfig::Budget(budget) => json!({ "thinkingBudget": budget }),
        }
    }
}

impl ModelId {
    pub const ALL: [ModelId; 3] = [
        ModelId::Gemini3Pro,
        ModelId::Gemini25Pro,
        ModelId::Gemini25Flash,
    ];

    /// Identifier used in the REST path
    pub fn api_id(self) -> &'static str {
        match self {
            ModelId::Gemini3Pro => "gemini-3-pro-preview",
            ModelId::Gemini25Pro => "gemini-2.5-pro",
            ModelId::Gemini25Flash => "gemini-2.5-flash",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            ModelId::Gemini3Pro => "Gemini 3 Pro",
            ModelId::Gemini25Pro => "Gemini 2.5 Pro",
            ModelId::Gemini25Flash => "Gemini 2.5 Flash",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ModelId::Gemini3Pro => "Most capable model, deepest reasoning for rich lyrics",
            ModelId::Gemini25Pro => "Strong creative writing with adaptive thinking",
            ModelId::Gemini25Flash => "Fast and inexpensive, good for quick drafts",
        }
    }

    pub fn thinking(self) -> ThinkingConfig {
        match self {
            ModelId::Gemini3Pro => ThinkingConfig::Level("high"),
            ModelId::Gemini25Pro | ModelId::Gemini25Flash => ThinkingConfig::Budget(-1),
        }
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.api_id())
    }
}

/// Unknown model identifier
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown model: {0}")]
pub struct UnknownModel(pub String);

impl FromStr for ModelId {
    type Err = UnknownModel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModelId::ALL
            .into_iter()
            .find(|model| model.api_id() == s.trim())
            .ok_or_else(|| UnknownModel(s.to_string()))
    }
}
