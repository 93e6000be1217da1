//! The relay client: transport, timeout policy, and the entry points.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::errors::RelayError;
use crate::outline::{self, OutlineRequest};
use crate::protocol::{self, WireRequest, openai};
use crate::provider::{ProviderKind, ProviderRef, ProviderRegistry};
use crate::request::{Conversation, GenerateRequest};
use crate::response::{self, FetchLimits, NormalizedResult};
use crate::streaming::RelayStream;

/// Overall timeout applied to every outbound call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);
/// Connection-establishment timeout applied to every outbound call.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Outcome of [`Client::generate`].
#[derive(Debug)]
pub enum GenerateReply {
    /// Buffered, normalized result.
    Complete(NormalizedResult),
    /// Raw upstream bytes to forward to the caller, typically under
    /// [`EVENT_STREAM_CONTENT_TYPE`](crate::EVENT_STREAM_CONTENT_TYPE).
    Streaming(RelayStream),
}

/// The relay client.
///
/// One instance is built at startup with its provider registry injected,
/// then shared across request handlers; calls are stateless between
/// requests. Cloning is cheap and shares the underlying HTTP pool.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use genrelay::{Client, GenerateReply, ProviderKind, ProviderRef, StaticRegistry};
///
/// # async fn example() -> Result<(), genrelay::RelayError> {
/// let mut registry = StaticRegistry::new();
/// registry.insert(
///     "default",
///     ProviderRef {
///         kind: ProviderKind::OpenAiCompatible,
///         host: "https://api.example.com".to_string(),
///         api_key: "sk-...".to_string(),
///         model: "banana-image-1".to_string(),
///     },
/// );
///
/// let client = Client::new(Arc::new(registry));
/// let request = serde_json::from_str(
///     r#"{"providerId": "default", "prompt": "a red panda"}"#,
/// )?;
///
/// match client.generate(request).await? {
///     GenerateReply::Complete(result) => println!("{} image(s)", result.images.len()),
///     GenerateReply::Streaming(_stream) => { /* forward the bytes */ }
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    registry: Arc<dyn ProviderRegistry>,
    http: reqwest::Client,
    stream_http: reqwest::Client,
    timeout: Duration,
    fetch_limits: FetchLimits,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("fetch_limits", &self.fetch_limits)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Client`] instances.
#[derive(Clone)]
pub struct ClientBuilder {
    registry: Arc<dyn ProviderRegistry>,
    timeout: Duration,
    connect_timeout: Duration,
    fetch_limits: FetchLimits,
}

impl ClientBuilder {
    /// Sets the overall request timeout. Defaults to [`DEFAULT_TIMEOUT`];
    /// generation calls routinely run for minutes. Buffered calls carry it
    /// as a total deadline; relayed streams apply it per chunk gap instead,
    /// so a stream that keeps producing bytes is never cut.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the connection timeout. Defaults to
    /// [`DEFAULT_CONNECT_TIMEOUT`].
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Caps how many remote image references are fetched per response.
    #[must_use]
    pub const fn max_remote_images(mut self, max: usize) -> Self {
        self.fetch_limits.max_images = max;
        self
    }

    /// Caps the accepted body size of each fetched remote image.
    #[must_use]
    pub const fn max_remote_image_bytes(mut self, max: usize) -> Self {
        self.fetch_limits.max_bytes = max;
        self
    }

    /// Builds the [`Client`].
    #[must_use]
    pub fn build(self) -> Client {
        let http = reqwest::Client::builder()
            .timeout(self.timeout)
            .connect_timeout(self.connect_timeout)
            .build()
            .expect("failed to build HTTP client");

        // reqwest's `timeout` is a total request deadline and would cut a
        // healthy long-running stream; relayed streams go through a client
        // without it and the policy is enforced per chunk gap instead.
        let stream_http = reqwest::Client::builder()
            .connect_timeout(self.connect_timeout)
            .build()
            .expect("failed to build HTTP client");

        Client {
            registry: self.registry,
            http,
            stream_http,
            timeout: self.timeout,
            fetch_limits: self.fetch_limits,
        }
    }
}

impl Client {
    /// Creates a builder with the default timeout policy and fetch limits.
    #[must_use]
    pub fn builder(registry: Arc<dyn ProviderRegistry>) -> ClientBuilder {
        ClientBuilder {
            registry,
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            fetch_limits: FetchLimits::default(),
        }
    }

    /// Creates a client with all defaults.
    #[must_use]
    pub fn new(registry: Arc<dyn ProviderRegistry>) -> Self {
        Self::builder(registry).build()
    }

    /// Serves one unified generation request.
    ///
    /// Resolves the provider, translates the conversation into the
    /// provider's dialect and either relays the byte stream (OpenAI-
    /// compatible providers with `streaming` set) or buffers and
    /// normalizes the response. Gemini providers are always buffered,
    /// whatever the streaming flag says.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::ProviderNotFound`] for an unknown provider
    /// id (no upstream call is made), the transport classifications of
    /// [`RelayError`] for upstream failures, and
    /// [`RelayError::MalformedPayload`] when a buffered body is not the
    /// expected JSON. Remote-image fetch failures during normalization
    /// are not errors; the affected image is dropped.
    pub async fn generate(&self, request: GenerateRequest) -> Result<GenerateReply, RelayError> {
        let provider = self.resolve(&request.provider_id).await?;

        let conversation = Conversation::from_request(&request);
        let wire = protocol::build_wire_request(&provider, &conversation, &request.settings);
        debug!(
            provider_id = %request.provider_id,
            kind = ?provider.kind,
            streaming = request.settings.streaming,
            turns = conversation.turns.len(),
            "relaying generation request"
        );

        if request.settings.streaming && provider.kind == ProviderKind::OpenAiCompatible {
            let response = self.send_streaming(&wire).await?;
            return Ok(GenerateReply::Streaming(RelayStream::new(response, self.timeout)));
        }

        let response = self.send(&wire).await?;
        let result = match provider.kind {
            ProviderKind::OpenAiCompatible => {
                let body = Self::decode(response).await?;
                response::normalize_openai(&self.http, body, self.fetch_limits).await
            }
            ProviderKind::GeminiNative => {
                let body = Self::decode(response).await?;
                response::normalize_gemini(body)
            }
        };

        Ok(GenerateReply::Complete(result))
    }

    /// Generates a structured JSON outline.
    ///
    /// Always speaks the chat-completions dialect, non-streaming; the
    /// provider entry is passed through unvalidated.
    ///
    /// # Errors
    ///
    /// Same classifications as [`Client::generate`];
    /// [`RelayError::MalformedPayload`] additionally covers a response
    /// whose content is not a JSON document.
    pub async fn generate_outline(
        &self,
        request: OutlineRequest,
    ) -> Result<serde_json::Value, RelayError> {
        let provider = self.resolve(&request.provider_id).await?;

        let wire = openai::build_single_turn(&provider, &request.message_text(), &request.images);
        debug!(provider_id = %request.provider_id, "relaying outline request");

        let response = self.send(&wire).await?;
        let body: response::ChatCompletionBody = Self::decode(response).await?;
        let content = body.first_content().ok_or_else(|| {
            RelayError::MalformedPayload("response carried no choices".to_string())
        })?;

        outline::parse_outline(&content)
    }

    async fn resolve(&self, provider_id: &str) -> Result<ProviderRef, RelayError> {
        self.registry
            .resolve(provider_id)
            .await
            .ok_or_else(|| RelayError::ProviderNotFound(provider_id.to_string()))
    }

    /// POSTs a wire request on the buffered client and classifies the
    /// outcome. A non-2xx status becomes [`RelayError::UpstreamHttp`] with
    /// the body passed through verbatim, before any parsing is attempted.
    async fn send(&self, wire: &WireRequest) -> Result<reqwest::Response, RelayError> {
        let response = self
            .post(&self.http, wire)
            .send()
            .await
            .map_err(RelayError::from)?;
        Self::check(response).await
    }

    /// Like [`Client::send`] but on the stream client, which carries no
    /// total deadline. The wait for response headers (and any error body)
    /// is bounded here; the relay bounds each chunk gap afterwards.
    async fn send_streaming(&self, wire: &WireRequest) -> Result<reqwest::Response, RelayError> {
        let sent = async {
            let response = self
                .post(&self.stream_http, wire)
                .send()
                .await
                .map_err(RelayError::from)?;
            Self::check(response).await
        };

        tokio::time::timeout(self.timeout, sent)
            .await
            .map_err(|_stalled| RelayError::UpstreamTimeout(None))?
    }

    fn post(&self, http: &reqwest::Client, wire: &WireRequest) -> reqwest::RequestBuilder {
        let mut builder = http.post(&wire.url).json(&wire.body);
        if let Some(token) = &wire.bearer {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    /// Rejects a non-2xx response, carrying its body through verbatim.
    async fn check(response: reqwest::Response) -> Result<reqwest::Response, RelayError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|err| format!("failed to read upstream error body: {err}"));
            return Err(RelayError::UpstreamHttp {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }

    /// Buffers a 2xx response body and decodes it as `T`.
    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, RelayError> {
        let text = response.text().await.map_err(RelayError::from)?;
        Ok(serde_json::from_str(&text)?)
    }
}
