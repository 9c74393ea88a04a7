//! Together AI provider (OpenAI-compatible).

use std::time::Duration;

use async_trait::async_trait;

use crate::error::ParleyError;
use crate::types::FragmentStream;

use super::openai::OpenAiProvider;
use super::{ModelProvider, ProviderRequest, ProviderResponse};

pub const TOGETHER_BASE_URL: &str = "https://api.together.xyz/v1";

pub struct TogetherProvider {
    inner: OpenAiProvider,
}

impl TogetherProvider {
    pub fn new(model_id: String, api_key: String, base_url: Option<String>) -> Self {
        let base_url = base_url.unwrap_or_else(|| TOGETHER_BASE_URL.to_string());
        Self {
            inner: OpenAiProvider::new(model_id, api_key, Some(base_url))
                .with_provider_name("together"),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.inner = self.inner.with_timeout(timeout);
        self
    }
}

#[async_trait]
impl ModelProvider for TogetherProvider {
    fn provider_name(&self) -> &str {
        self.inner.provider_name()
    }
    fn model_id(&self) -> &str {
        self.inner.model_id()
    }
    async fn generate_text(
        &self,
        request: &ProviderRequest,
    ) -> Result<ProviderResponse, ParleyError> {
        self.inner.generate_text(request).await
    }
    async fn stream_text(&self, request: &ProviderRequest) -> Result<FragmentStream, ParleyError> {
        self.inner.stream_text(request).await
    }
}
