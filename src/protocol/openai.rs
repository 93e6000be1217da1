//! The OpenAI-compatible chat-completions dialect.

use serde::Serialize;

use super::WireRequest;
use crate::provider::ProviderRef;
use crate::request::{Conversation, GenerateSettings, Role};

#[derive(Debug, Serialize)]
struct ChatPayload<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    stream: bool,
    size: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    aspect_ratio: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: Role,
    content: Vec<ContentPart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

/// Maps the coarse resolution setting onto the dialect's `size` string.
/// Anything unrecognized falls back to the smallest size.
fn map_resolution(resolution: &str) -> &'static str {
    match resolution {
        "1K" => "1024x1024",
        "2K" => "2048x2048",
        "4K" => "4096x4096",
        _ => "1024x1024",
    }
}

/// Outbound images always declare JPEG framing, whatever the source bytes
/// actually were.
fn image_part(base64: &str) -> ContentPart<'_> {
    ContentPart::ImageUrl {
        image_url: ImageUrl {
            url: format!("data:image/jpeg;base64,{base64}"),
        },
    }
}

fn wire_messages(conversation: &Conversation) -> Vec<Message<'_>> {
    conversation
        .turns
        .iter()
        .map(|turn| {
            let mut content = vec![ContentPart::Text { text: &turn.text }];
            content.extend(turn.images.iter().map(|b64| image_part(b64)));
            Message {
                role: turn.role,
                content,
            }
        })
        .collect()
}

/// Endpoint for a chat-completions call against `host`.
pub(crate) fn endpoint(host: &str) -> String {
    format!("{}/v1/chat/completions", host.trim_end_matches('/'))
}

/// Builds the generation wire request: the message array mirrors the
/// canonical conversation turn for turn.
pub(crate) fn build(
    provider: &ProviderRef,
    conversation: &Conversation,
    settings: &GenerateSettings,
) -> WireRequest {
    let payload = ChatPayload {
        model: &provider.model,
        messages: wire_messages(conversation),
        stream: settings.streaming,
        size: map_resolution(&settings.resolution),
        aspect_ratio: settings.explicit_aspect_ratio(),
    };

    WireRequest {
        url: endpoint(&provider.host),
        bearer: Some(provider.api_key.clone()),
        body: serde_json::to_value(&payload).expect("chat payload serializes"),
    }
}

/// Builds a plain non-streaming chat request from a single user message:
/// `text`, then JPEG-framed image entries. Used by outline generation,
/// which has no resolution or aspect-ratio knobs.
pub(crate) fn build_single_turn(
    provider: &ProviderRef,
    text: &str,
    images: &[String],
) -> WireRequest {
    #[derive(Debug, Serialize)]
    struct PlainChatPayload<'a> {
        model: &'a str,
        stream: bool,
        messages: Vec<Message<'a>>,
    }

    let mut content = vec![ContentPart::Text { text }];
    content.extend(images.iter().map(|b64| image_part(b64)));

    let payload = PlainChatPayload {
        model: &provider.model,
        stream: false,
        messages: vec![Message {
            role: Role::User,
            content,
        }],
    };

    WireRequest {
        url: endpoint(&provider.host),
        bearer: Some(provider.api_key.clone()),
        body: serde_json::to_value(&payload).expect("chat payload serializes"),
    }
}
