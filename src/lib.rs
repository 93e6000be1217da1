//! One generation request, two upstream dialects.
//!
//! `genrelay` turns a unified multimodal generation request into either an
//! OpenAI-style chat-completions call or a Gemini-native generateContent
//! call, and folds both providers' heterogeneous outputs (interleaved
//! prose and images, inline or behind remote URLs) into one canonical
//! `{text, images[]}` result.
//!
//! The crate is deliberately small in scope: it resolves nothing itself
//! (providers come from an injected [`ProviderRegistry`]), stores nothing,
//! and retries nothing. Streaming requests against OpenAI-compatible
//! providers are relayed byte for byte; everything else is buffered and
//! normalized.
//!
//! # Quick start
//!
//! ```no_run
//! use std::sync::Arc;
//! use genrelay::{Client, GenerateReply, ProviderKind, ProviderRef, StaticRegistry};
//!
//! # async fn example() -> Result<(), genrelay::RelayError> {
//! let mut registry = StaticRegistry::new();
//! registry.insert(
//!     "gemini-default",
//!     ProviderRef {
//!         kind: ProviderKind::GeminiNative,
//!         host: "https://generativelanguage.googleapis.com".to_string(),
//!         api_key: std::env::var("GEMINI_API_KEY").unwrap_or_default(),
//!         model: "gemini-2.5-flash-image".to_string(),
//!     },
//! );
//!
//! let client = Client::new(Arc::new(registry));
//! let request = serde_json::from_str(
//!     r#"{"providerId": "gemini-default", "prompt": "a lighthouse at dusk"}"#,
//! )?;
//!
//! if let GenerateReply::Complete(result) = client.generate(request).await? {
//!     println!("text: {}", result.text);
//!     println!("images: {}", result.images.len());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Credentials
//!
//! OpenAI-compatible providers authenticate via an `Authorization` header.
//! The Gemini dialect instead requires the key in the URL query string, so
//! full-URL logging on any hop will capture it; this crate never logs
//! upstream URLs.

mod client;
mod errors;
mod outline;
mod protocol;
mod provider;
mod request;
mod response;
mod streaming;

#[cfg(test)]
mod response_tests;

pub use client::{Client, ClientBuilder, DEFAULT_CONNECT_TIMEOUT, DEFAULT_TIMEOUT, GenerateReply};
pub use errors::RelayError;
pub use outline::OutlineRequest;
pub use provider::{ProviderKind, ProviderRef, ProviderRegistry, StaticRegistry};
pub use request::{
    Conversation, GenerateRequest, GenerateSettings, HistoryMessage, Role, Turn,
};
pub use response::{FetchLimits, ImageAsset, NormalizedResult};
pub use streaming::{EVENT_STREAM_CONTENT_TYPE, RelayStream};
