//! Model-call collaborator trait and implementations.

pub mod http;

#[cfg(feature = "openai")]
pub mod openai;

#[cfg(feature = "together")]
pub mod together;

use std::fmt;

use async_trait::async_trait;
use tracing::debug;

use crate::config::{ParleyConfig, ProviderKind};
use crate::error::ParleyError;
use crate::types::{FragmentStream, GenerationSettings, Turn};

/// A request sent to a model provider.
#[derive(Debug, Clone)]
pub struct ProviderRequest {
    pub messages: Vec<Turn>,
    pub settings: GenerationSettings,
}

impl ProviderRequest {
    /// Single user prompt with default settings.
    pub fn prompt(prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![Turn::user(prompt)],
            settings: GenerationSettings::default(),
        }
    }
}

/// Non-streaming response from a provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderResponse {
    pub text: String,
}

/// What the model-call collaborator hands back for one prompt.
pub enum Completion {
    /// Fragments to be consumed in order.
    Stream(FragmentStream),
    /// The whole answer at once.
    Text(String),
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stream(_) => f.write_str("Completion::Stream(..)"),
            Self::Text(text) => f.debug_tuple("Completion::Text").field(text).finish(),
        }
    }
}

/// Core trait implemented by all model providers.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Provider name (e.g., "together").
    fn provider_name(&self) -> &str;
    /// The model ID this provider instance serves.
    fn model_id(&self) -> &str;

    /// Generate text (non-streaming).
    async fn generate_text(&self, request: &ProviderRequest)
        -> Result<ProviderResponse, ParleyError>;

    /// Generate text (streaming).
    async fn stream_text(&self, request: &ProviderRequest) -> Result<FragmentStream, ParleyError>;

    /// Send `request` in the requested mode.
    async fn complete_request(
        &self,
        request: &ProviderRequest,
        stream: bool,
    ) -> Result<Completion, ParleyError> {
        debug!(
            provider = self.provider_name(),
            model = self.model_id(),
            stream,
            "complete"
        );
        if stream {
            Ok(Completion::Stream(self.stream_text(request).await?))
        } else {
            Ok(Completion::Text(self.generate_text(request).await?.text))
        }
    }

    /// Send a single prompt in the requested mode.
    async fn complete(&self, prompt: &str, stream: bool) -> Result<Completion, ParleyError> {
        self.complete_request(&ProviderRequest::prompt(prompt), stream)
            .await
    }
}

/// Create the provider selected by `config`, wrapped in the response cache
/// when the cache is enabled.
pub fn create_provider(config: &ParleyConfig) -> Result<Box<dyn ModelProvider>, ParleyError> {
    let api_key = config.require_api_key()?;
    let base_url = config.base_url().map(str::to_string);
    let timeout = config.request_timeout();

    let provider: Box<dyn ModelProvider> = match config.provider() {
        #[cfg(feature = "together")]
        ProviderKind::Together => Box::new(
            together::TogetherProvider::new(config.model_name().to_string(), api_key, base_url)
                .with_timeout(timeout),
        ),
        #[cfg(feature = "openai")]
        ProviderKind::OpenAi => Box::new(
            openai::OpenAiProvider::new(config.model_name().to_string(), api_key, base_url)
                .with_timeout(timeout),
        ),
        #[allow(unreachable_patterns)]
        other => {
            return Err(ParleyError::Configuration(format!(
                "Provider '{other}' not enabled via feature flags"
            )))
        }
    };

    let cache = config.cache_policy();
    if cache.is_enabled() {
        return Ok(Box::new(crate::cache::CachedProvider::new(provider, cache)));
    }
    Ok(provider)
}
