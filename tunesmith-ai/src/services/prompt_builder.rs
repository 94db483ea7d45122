//! Instructions and structured-output schema sent to the model

use crate::models::metadata::{ALLOWED_TIME_SIGNATURES, MAX_BPM, MIN_BPM};
use serde_json::{json, Value};

/// Schema the model's JSON answer must follow
pub fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "title": { "type": "STRING", "description": "Song title, 1-5 words" },
            "lyrics": { "type": "STRING", "description": "Full lyrics with section markers" },
            "style": { "type": "STRING", "description": "Comma-separated style descriptors" },
            "bpm": { "type": "INTEGER", "description": "Tempo in beats per minute" },
            "keyScale": { "type": "STRING", "description": "Key and mode, e.g. 'A minor'" },
            "timeSignature": { "type": "STRING", "description": "Time signature, e.g. '4/4'" }
        },
        "required": ["title", "lyrics", "style", "bpm", "keyScale", "timeSignature"],
        "propertyOrdering": ["title", "lyrics", "style", "bpm", "keyScale", "timeSignature"]
    })
}

fn format_rules() -> String {
    format!(
        "Respond with a single JSON object with exactly these six fields:\n\
         - \"title\": a short, evocative title of 1 to 5 words.\n\
         - \"lyrics\": complete lyrics. Mark every section on its own line with a tag in square \
         brackets such as [Intro], [Verse], [Pre-Chorus], [Chorus], [Bridge] and [Outro]. Use \
         line breaks between lines.\n\
         - \"style\": 6 to 12 comma-separated descriptors covering genre, sub-genre, instruments, \
         vocal type, mood and production, e.g. \"synthwave, retro, female vocals, analog synth, \
         nostalgic\". Be dense and specific; no full sentences.\n\
         - \"bpm\": an integer tempo between {min} and {max}.\n\
         - \"keyScale\": a key such as \"C major\", \"F# minor\" or \"Bb major\".\n\
         - \"timeSignature\": one of {signatures}.\n\
         Do not include any text outside the JSON object.",
        min = MIN_BPM,
        max = MAX_BPM,
        signatures = ALLOWED_TIME_SIGNATURES.join(", "),
    )
}

/// Instruction for a brand-new song
pub fn generation_prompt(topic: &str, style: &str) -> String {
    let style_line = if style.trim().is_empty() {
        "Musical style: choose whatever style suits the topic best.".to_string()
    } else {
        format!("Musical style: {}", style.trim())
    };

    format!(
        "You are a professional songwriter and music producer. Write an original song.\n\n\
         Topic / creative brief: {}\n\
         {}\n\n\
         The lyrics should have a clear structure with at least two verses and a recurring \
         chorus, vivid imagery and natural rhythm. Pick a tempo, key and time signature that \
         fit the style.\n\n\
         {}",
        topic.trim(),
        style_line,
        format_rules()
    )
}

/// Instruction for improving existing metadata
///
/// With lyrics: polish both lyrics and style while keeping the theme.
/// Without lyrics: derive a style description, title and example lyrics from the style alone.
pub fn enhancement_prompt(current_style: &str, current_lyrics: &str) -> String {
    let task = if current_lyrics.trim().is_empty() {
        format!(
            "The user only has a rough style idea: \"{}\".\n\
             Expand it into a rich, specific style description, invent a fitting title and \
             write example lyrics that match the style.",
            current_style.trim()
        )
    } else {
        format!(
            "Improve the following song. Keep its theme, story and overall meaning, but make \
             the lyrics more vivid and better structured, and make the style description \
             richer and more specific.\n\n\
             Current style: \"{}\"\n\
             Current lyrics:\n{}",
            current_style.trim(),
            current_lyrics.trim()
        )
    };

    format!(
        "You are a professional songwriter and music producer.\n\n{}\n\n{}",
        task,
        format_rules()
    )
}
