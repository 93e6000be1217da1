//! Normalization of upstream response bodies into the canonical result.
//!
//! Both dialects embed images in free-form structures: markdown markup
//! inside a content string for the chat-completions dialect, ordered
//! `inline_data` parts for the Gemini dialect. This module flattens both
//! into [`NormalizedResult`].

use std::sync::LazyLock;

use base64::Engine as _;
use futures_util::StreamExt;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Mime type recorded when none can be recovered.
const FALLBACK_MIME: &str = "image/jpeg";

/// One generated image, carried as a self-contained data URI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageAsset {
    /// `data:<mime>;base64,<payload>`.
    pub base64: String,
    #[serde(rename = "mimeType")]
    pub mime_type: String,
}

/// Canonical outcome of a buffered generation call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedResult {
    pub text: String,
    pub images: Vec<ImageAsset>,
}

/// Bounds on secondary image fetches.
///
/// Upstream free text decides how many remote URLs appear, so an
/// unbounded normalizer could be made to fan out arbitrarily. Both the
/// fetch count and each body size are capped; surplus references are
/// dropped like any other single-image failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchLimits {
    /// Maximum number of remote image references fetched per response.
    pub max_images: usize,
    /// Maximum accepted body size per fetched image, in bytes.
    pub max_bytes: usize,
}

impl Default for FetchLimits {
    fn default() -> Self {
        Self {
            max_images: 16,
            max_bytes: 8 * 1024 * 1024,
        }
    }
}

// The two markup patterns are disjoint (a data URI never starts with
// "http") and part of the observable contract: the data-URI batch always
// precedes the remote batch in the final image list. Alt text may not
// contain `]`, so one piece of markup is always one match.
static DATA_URI_IMAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[[^\]]*\]\((data:image/[^)]+)\)").expect("pattern compiles"));
static REMOTE_URL_IMAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[[^\]]*\]\((https?://[^)]+)\)").expect("pattern compiles"));

/// Markdown image markup pulled out of free text, each batch in its own
/// document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ExtractedImages {
    pub text: String,
    pub data_uris: Vec<String>,
    pub remote_urls: Vec<String>,
}

/// Splits markdown image markup out of `content`.
///
/// The two patterns are scanned independently, so the split decouples
/// image order from textual interleaving order. The returned text has
/// every matched span removed and is trimmed.
pub(crate) fn extract_image_markup(content: &str) -> ExtractedImages {
    let data_uris = DATA_URI_IMAGE
        .captures_iter(content)
        .map(|captures| captures[1].to_string())
        .collect();
    let remote_urls = REMOTE_URL_IMAGE
        .captures_iter(content)
        .map(|captures| captures[1].to_string())
        .collect();

    let text = DATA_URI_IMAGE.replace_all(content, "");
    let text = REMOTE_URL_IMAGE.replace_all(&text, "");

    ExtractedImages {
        text: text.trim().to_string(),
        data_uris,
        remote_urls,
    }
}

/// Mime type from a `data:` URI header, [`FALLBACK_MIME`] when the header
/// is unparseable.
fn data_uri_mime(data_uri: &str) -> String {
    data_uri
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(';'))
        .map(|(mime, _)| mime.to_string())
        .unwrap_or_else(|| FALLBACK_MIME.to_string())
}

/// Why a single remote image was dropped. Never escapes normalization:
/// fetch failures are logged and the image is skipped.
#[derive(Debug, thiserror::Error)]
enum FetchError {
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
    #[error("upstream returned HTTP {0}")]
    Status(u16),
    #[error("body exceeds the {limit}-byte cap")]
    TooLarge { limit: usize },
}

/// Downloads `url` and re-encodes the body as a base64 data URI. The mime
/// inside the URI comes from the `content-type` header. The body is read
/// chunk by chunk and abandoned the moment it exceeds `max_bytes`, so an
/// oversized response is never buffered whole.
async fn fetch_image_as_data_uri(
    http: &reqwest::Client,
    url: &str,
    max_bytes: usize,
) -> Result<String, FetchError> {
    let response = http.get(url).send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status(status.as_u16()));
    }

    let mime = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(|value| value.trim().to_string())
        .unwrap_or_else(|| FALLBACK_MIME.to_string());

    let mut body = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if body.len() + chunk.len() > max_bytes {
            return Err(FetchError::TooLarge { limit: max_bytes });
        }
        body.extend_from_slice(&chunk);
    }

    let encoded = base64::engine::general_purpose::STANDARD.encode(&body);
    Ok(format!("data:{mime};base64,{encoded}"))
}

/// Wire shape of a chat-completions response body; only the first choice
/// is ever consulted.
#[derive(Debug, Deserialize)]
pub(crate) struct ChatCompletionBody {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

impl ChatCompletionBody {
    /// Content of the first choice, if any choice carries a message.
    /// A message without content reads as empty.
    pub(crate) fn first_content(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()?
            .message
            .map(|message| message.content.unwrap_or_default())
    }
}

/// Normalizes a chat-completions body.
///
/// Data-URI images are recorded verbatim, in document order. Remote URLs
/// are then fetched (bounded by `limits`) and inlined, in their own
/// document order, never interleaved with the data-URI batch. A failed
/// fetch drops that one image and nothing else.
pub(crate) async fn normalize_openai(
    http: &reqwest::Client,
    body: ChatCompletionBody,
    limits: FetchLimits,
) -> NormalizedResult {
    let Some(content) = body.first_content() else {
        return NormalizedResult::default();
    };

    let extracted = extract_image_markup(&content);

    let mut images: Vec<ImageAsset> = extracted
        .data_uris
        .into_iter()
        .map(|uri| ImageAsset {
            mime_type: data_uri_mime(&uri),
            base64: uri,
        })
        .collect();

    if extracted.remote_urls.len() > limits.max_images {
        warn!(
            total = extracted.remote_urls.len(),
            limit = limits.max_images,
            "dropping remote image references beyond the fetch limit"
        );
    }
    for url in extracted.remote_urls.iter().take(limits.max_images) {
        match fetch_image_as_data_uri(http, url, limits.max_bytes).await {
            Ok(data_uri) => images.push(ImageAsset {
                base64: data_uri,
                mime_type: FALLBACK_MIME.to_string(),
            }),
            Err(error) => {
                warn!(url = %url, error = %error, "failed to fetch remote image, omitting it");
            }
        }
    }

    NormalizedResult {
        text: extracted.text,
        images,
    }
}

fn fallback_mime() -> String {
    FALLBACK_MIME.to_string()
}

/// Wire shape of a generateContent response body; only the first candidate
/// is ever consulted.
#[derive(Debug, Deserialize)]
pub(crate) struct GenerateContentBody {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
    #[serde(alias = "inlineData")]
    inline_data: Option<InlineBlob>,
}

#[derive(Debug, Deserialize)]
struct InlineBlob {
    #[serde(default = "fallback_mime", alias = "mimeType")]
    mime_type: String,
    #[serde(default)]
    data: String,
}

/// Normalizes a generateContent body.
///
/// Parts are walked strictly in array order: text fragments accumulate,
/// inline blobs become assets. Output order is array order, with no
/// decoupling step here, unlike the chat-completions path.
pub(crate) fn normalize_gemini(body: GenerateContentBody) -> NormalizedResult {
    let Some(content) = body
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
    else {
        return NormalizedResult::default();
    };

    let mut result = NormalizedResult::default();
    for part in content.parts {
        if let Some(text) = part.text {
            result.text.push_str(&text);
        }
        if let Some(blob) = part.inline_data {
            let base64 = if blob.data.starts_with("data:") {
                blob.data
            } else {
                format!("data:{};base64,{}", blob.mime_type, blob.data)
            };
            result.images.push(ImageAsset {
                base64,
                mime_type: blob.mime_type,
            });
        }
    }
    result
}
