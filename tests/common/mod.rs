//! Shared helpers for the wiremock-based integration suites.

#![allow(dead_code)] // not every suite uses every helper

use std::sync::Arc;

use genrelay::{Client, ClientBuilder, ProviderKind, ProviderRef, StaticRegistry};
use wiremock::MockServer;

pub const OPENAI_KEY: &str = "sk-test";
pub const GEMINI_KEY: &str = "gm-test";

pub fn openai_provider(server: &MockServer) -> ProviderRef {
    ProviderRef {
        kind: ProviderKind::OpenAiCompatible,
        host: server.uri(),
        api_key: OPENAI_KEY.to_string(),
        model: "banana-image-1".to_string(),
    }
}

pub fn gemini_provider(server: &MockServer) -> ProviderRef {
    ProviderRef {
        kind: ProviderKind::GeminiNative,
        host: server.uri(),
        api_key: GEMINI_KEY.to_string(),
        model: "banana-native".to_string(),
    }
}

/// A client whose registry holds exactly one provider under `id`.
pub fn client_with(id: &str, provider: ProviderRef) -> Client {
    builder_with(id, provider).build()
}

/// Like [`client_with`], but leaves the builder open for overrides.
pub fn builder_with(id: &str, provider: ProviderRef) -> ClientBuilder {
    let mut registry = StaticRegistry::new();
    registry.insert(id, provider);
    Client::builder(Arc::new(registry))
}

/// Deserializes an inbound request literal.
pub fn request(json: &str) -> genrelay::GenerateRequest {
    serde_json::from_str(json).expect("request literal parses")
}
