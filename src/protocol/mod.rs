//! Translation of the canonical conversation into upstream wire requests.
//!
//! Exactly two upstream dialects exist; the match in
//! [`build_wire_request`] is the only place the relay branches on provider
//! kind for payload construction.

pub(crate) mod gemini;
pub(crate) mod openai;

use crate::provider::{ProviderKind, ProviderRef};
use crate::request::{Conversation, GenerateSettings};

/// A fully prepared upstream request: where to POST, how to authenticate,
/// and the JSON body to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct WireRequest {
    pub url: String,
    /// Bearer token for the `Authorization` header. `None` for the Gemini
    /// dialect, which carries its credential in the URL.
    pub bearer: Option<String>,
    pub body: serde_json::Value,
}

/// Builds the wire request for the provider's dialect.
pub(crate) fn build_wire_request(
    provider: &ProviderRef,
    conversation: &Conversation,
    settings: &GenerateSettings,
) -> WireRequest {
    match provider.kind {
        ProviderKind::OpenAiCompatible => openai::build(provider, conversation, settings),
        ProviderKind::GeminiNative => gemini::build(provider, conversation, settings),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ProviderKind;
    use crate::request::GenerateRequest;

    fn provider(kind: ProviderKind) -> ProviderRef {
        ProviderRef {
            kind,
            host: "https://api.example.com/".to_string(),
            api_key: "k".to_string(),
            model: "m".to_string(),
        }
    }

    fn conversation() -> Conversation {
        let request: GenerateRequest =
            serde_json::from_str(r#"{"providerId": "p", "prompt": "hello"}"#).unwrap();
        Conversation::from_request(&request)
    }

    #[test]
    fn test_dispatch_selects_dialect_by_kind() {
        let settings = GenerateSettings::default();

        let wire = build_wire_request(
            &provider(ProviderKind::OpenAiCompatible),
            &conversation(),
            &settings,
        );
        assert!(wire.url.ends_with("/v1/chat/completions"));
        assert!(wire.bearer.is_some());

        let wire = build_wire_request(
            &provider(ProviderKind::GeminiNative),
            &conversation(),
            &settings,
        );
        assert!(wire.url.contains(":generateContent"));
        assert!(wire.bearer.is_none());
    }
}
