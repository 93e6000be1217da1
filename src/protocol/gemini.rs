//! The Gemini-native generateContent dialect.

use serde::Serialize;

use super::WireRequest;
use crate::provider::ProviderRef;
use crate::request::{Conversation, GenerateSettings, Role};

#[derive(Debug, Serialize)]
struct GeneratePayload<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig<'a>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text { text: &'a str },
    Inline { inline_data: Blob<'a> },
}

#[derive(Debug, Serialize)]
struct Blob<'a> {
    mime_type: &'static str,
    data: &'a str,
}

#[derive(Debug, Serialize)]
struct GenerationConfig<'a> {
    #[serde(rename = "responseModalities")]
    response_modalities: [&'static str; 2],
    #[serde(rename = "imageConfig")]
    image_config: ImageConfig<'a>,
}

#[derive(Debug, Serialize)]
struct ImageConfig<'a> {
    #[serde(rename = "imageSize")]
    image_size: &'a str,
    #[serde(rename = "aspectRatio", skip_serializing_if = "Option::is_none")]
    aspect_ratio: Option<&'a str>,
}

/// Folds the canonical role onto the dialect's two-value vocabulary: user
/// stays user, everything else speaks as the model.
const fn wire_role(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Assistant => "model",
    }
}

/// Builds the generation wire request.
///
/// Images travel as `inline_data` blobs holding the raw base64 (no
/// data-URI prefix). The resolution string is forwarded verbatim; this
/// dialect has no size table.
///
/// The credential goes into the query string because that is how the
/// upstream authenticates; anything logging full URLs will capture it.
pub(crate) fn build(
    provider: &ProviderRef,
    conversation: &Conversation,
    settings: &GenerateSettings,
) -> WireRequest {
    let contents = conversation
        .turns
        .iter()
        .map(|turn| {
            let mut parts = vec![Part::Text { text: &turn.text }];
            parts.extend(turn.images.iter().map(|b64| Part::Inline {
                inline_data: Blob {
                    mime_type: "image/jpeg",
                    data: b64,
                },
            }));
            Content {
                role: wire_role(turn.role),
                parts,
            }
        })
        .collect();

    let payload = GeneratePayload {
        contents,
        generation_config: GenerationConfig {
            response_modalities: ["TEXT", "IMAGE"],
            image_config: ImageConfig {
                image_size: &settings.resolution,
                aspect_ratio: settings.explicit_aspect_ratio(),
            },
        },
    };

    let url = format!(
        "{}/v1beta/models/{}:generateContent?key={}",
        provider.host.trim_end_matches('/'),
        provider.model,
        urlencoding::encode(&provider.api_key),
    );

    WireRequest {
        url,
        bearer: None,
        body: serde_json::to_value(&payload).expect("generate payload serializes"),
    }
}
