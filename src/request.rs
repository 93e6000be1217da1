//! The unified inbound request and its canonical conversation form.
//!
//! Everything upstream-specific is kept out of this module: a
//! [`GenerateRequest`] is translated into a [`Conversation`] first, and the
//! protocol adapters only ever see the conversation.

use serde::{Deserialize, Serialize};

/// Prompt used when the caller supplies none (or an empty string).
pub(crate) const DEFAULT_PROMPT: &str = "Generate image";

/// Speaker of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One prior turn of the conversation.
///
/// History carries text only; images are intentionally dropped from history
/// to bound payload growth across long sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryMessage {
    pub role: Role,
    pub content: String,
}

/// Generation settings.
///
/// Every field has a wire default, so an omitted or empty settings object
/// behaves like `{"resolution":"1K","aspectRatio":"auto","streaming":false}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateSettings {
    /// Coarse output resolution: `"1K"`, `"2K"` or `"4K"`. Carried as a
    /// free string because the Gemini dialect forwards it verbatim.
    #[serde(default = "default_resolution")]
    pub resolution: String,
    #[serde(default = "default_aspect_ratio", alias = "aspectRatio")]
    pub aspect_ratio: String,
    #[serde(default)]
    pub streaming: bool,
}

fn default_resolution() -> String {
    "1K".to_string()
}

fn default_aspect_ratio() -> String {
    "auto".to_string()
}

impl Default for GenerateSettings {
    fn default() -> Self {
        Self {
            resolution: default_resolution(),
            aspect_ratio: default_aspect_ratio(),
            streaming: false,
        }
    }
}

impl GenerateSettings {
    /// The aspect ratio to send upstream, if any. `"auto"` (and empty)
    /// means "let the provider decide" and is never sent.
    #[must_use]
    pub fn explicit_aspect_ratio(&self) -> Option<&str> {
        match self.aspect_ratio.as_str() {
            "" | "auto" => None,
            other => Some(other),
        }
    }
}

/// The unified generation request, one per call.
///
/// Image payloads are raw base64 strings without a data-URI prefix; each
/// protocol adapter applies its own framing.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateRequest {
    #[serde(alias = "providerId")]
    pub provider_id: String,
    #[serde(default)]
    pub prompt: Option<String>,
    /// Images attached to the current turn.
    #[serde(default)]
    pub images: Vec<String>,
    /// Prior turns, most recent last.
    #[serde(default, alias = "historyMessages")]
    pub history_messages: Vec<HistoryMessage>,
    /// Images from prior turns, replayed inside the current turn.
    #[serde(default, alias = "contextImages")]
    pub context_images: Vec<String>,
    #[serde(default)]
    pub settings: GenerateSettings,
}

/// One turn of the canonical conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub role: Role,
    pub text: String,
    /// Raw base64 payloads, in send order.
    pub images: Vec<String>,
}

/// Provider-agnostic ordered representation of the conversation: prior
/// turns first, then exactly one synthetic "current" user turn carrying the
/// prompt and every image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    pub turns: Vec<Turn>,
}

impl Conversation {
    /// Builds the canonical turn list from a request.
    ///
    /// History turns come first, text only. The final turn is the current
    /// user turn: prompt text (placeholder when empty), then context images
    /// in input order, then current images in input order.
    #[must_use]
    pub fn from_request(request: &GenerateRequest) -> Self {
        let mut turns: Vec<Turn> = request
            .history_messages
            .iter()
            .map(|msg| Turn {
                role: msg.role,
                text: msg.content.clone(),
                images: Vec::new(),
            })
            .collect();

        let prompt = match request.prompt.as_deref() {
            Some(text) if !text.is_empty() => text.to_string(),
            _ => DEFAULT_PROMPT.to_string(),
        };

        let mut images =
            Vec::with_capacity(request.context_images.len() + request.images.len());
        images.extend(request.context_images.iter().cloned());
        images.extend(request.images.iter().cloned());

        turns.push(Turn {
            role: Role::User,
            text: prompt,
            images,
        });

        Self { turns }
    }
}
