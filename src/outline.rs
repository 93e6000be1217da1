//! Structured outline generation over the chat-completions dialect.
//!
//! A second normalization flavor: the model is asked for a JSON document,
//! which arrives as free text and is usually wrapped in markdown code
//! fences. The fences are stripped and the remainder decoded.

use serde::Deserialize;
use serde_json::Value;

use crate::errors::RelayError;

/// Request for one structured outline.
#[derive(Debug, Clone, Deserialize)]
pub struct OutlineRequest {
    #[serde(alias = "providerId")]
    pub provider_id: String,
    /// What the outline should be about.
    pub topic: String,
    /// Instructions describing the expected JSON shape.
    #[serde(alias = "systemPrompt")]
    pub system_prompt: String,
    /// Reference images, raw base64.
    #[serde(default)]
    pub images: Vec<String>,
}

impl OutlineRequest {
    /// The single user message text: instructions first, topic below.
    pub(crate) fn message_text(&self) -> String {
        format!("{}\n\n{}", self.system_prompt, self.topic)
    }
}

/// Strips markdown code fences from `content` and decodes the remaining
/// text as JSON.
pub(crate) fn parse_outline(content: &str) -> Result<Value, RelayError> {
    let cleaned = content.replace("```json", "").replace("```", "");
    Ok(serde_json::from_str(cleaned.trim())?)
}
