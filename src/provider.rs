//! Provider descriptors and the registry boundary.
//!
//! The relay never stores providers itself: an embedding application
//! implements [`ProviderRegistry`] (typically database-backed) and the
//! relay resolves a descriptor per request, read-only.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// The upstream protocol family a provider speaks.
///
/// This is a closed set; dispatch on it happens in a single match inside
/// the protocol module, never by string comparison at call sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProviderKind {
    /// Chat-completions dialect: `POST {host}/v1/chat/completions` with
    /// `Authorization: Bearer` auth.
    #[serde(rename = "openai")]
    OpenAiCompatible,
    /// Native generateContent dialect:
    /// `POST {host}/v1beta/models/{model}:generateContent?key={key}`.
    ///
    /// The credential travels in the query string, as mandated by the
    /// upstream protocol, and worth knowing about operationally: query
    /// strings are routinely captured in access logs.
    #[serde(rename = "gemini")]
    GeminiNative,
}

/// Read-only descriptor of one upstream provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderRef {
    pub kind: ProviderKind,
    /// Base URL of the upstream, scheme included. A trailing `/` is
    /// tolerated and trimmed when endpoints are built.
    pub host: String,
    /// Credential, passed through to the upstream without validation.
    pub api_key: String,
    pub model: String,
}

/// Resolves a provider id to its descriptor.
///
/// Returning `None` makes the relay fail with
/// [`ProviderNotFound`](crate::RelayError::ProviderNotFound) before any
/// upstream call is made.
#[async_trait]
pub trait ProviderRegistry: Send + Sync {
    async fn resolve(&self, provider_id: &str) -> Option<ProviderRef>;
}

/// Fixed in-memory registry, for tests and static deployments.
#[derive(Debug, Default)]
pub struct StaticRegistry {
    providers: HashMap<String, ProviderRef>,
}

impl StaticRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `provider` under `id`, replacing any previous entry.
    pub fn insert(&mut self, id: impl Into<String>, provider: ProviderRef) {
        self.providers.insert(id.into(), provider);
    }
}

#[async_trait]
impl ProviderRegistry for StaticRegistry {
    async fn resolve(&self, provider_id: &str) -> Option<ProviderRef> {
        self.providers.get(provider_id).cloned()
    }
}
