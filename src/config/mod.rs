//! Configuration system (layered: code > secret store > env).

pub mod secrets;

pub use secrets::{FileSecretStore, SecretStore};

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use strum::{Display, EnumString};
use tracing::debug;

use crate::cache::CachePolicy;
use crate::error::ParleyError;

pub const DEFAULT_MODEL_NAME: &str = "deepseek-ai/DeepSeek-V3";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Hosted API the model name refers to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ProviderKind {
    #[default]
    Together,
    #[strum(serialize = "openai")]
    OpenAi,
}

impl ProviderKind {
    /// Key looked up in the secret store.
    pub fn secret_key(&self) -> &'static str {
        match self {
            Self::Together => "together_ai_api_key",
            Self::OpenAi => "openai_api_key",
        }
    }

    /// Environment variable holding the credential.
    pub fn env_var(&self) -> &'static str {
        match self {
            Self::Together => "TOGETHER_API_KEY",
            Self::OpenAi => "OPENAI_API_KEY",
        }
    }
}

/// Layered configuration for Parley.
///
/// Resolution order for the API key:
/// 1. Explicit key (`set_api_key`)
/// 2. Secret store (`secrets.toml`)
/// 3. Environment variable (`TOGETHER_API_KEY` / `OPENAI_API_KEY`)
#[derive(Clone)]
pub struct ParleyConfig {
    model_name: String,
    provider: ProviderKind,
    api_key: Option<String>,
    env_api_key: Option<String>,
    secret_store: Option<Arc<dyn SecretStore>>,
    base_url: Option<String>,
    request_timeout: Duration,
    cache: CachePolicy,
}

impl fmt::Debug for ParleyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParleyConfig")
            .field("model_name", &self.model_name)
            .field("provider", &self.provider)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("env_api_key", &self.env_api_key.as_ref().map(|_| "***"))
            .field("secret_store", &self.secret_store.as_ref().map(|_| ".."))
            .field("base_url", &self.base_url)
            .field("request_timeout", &self.request_timeout)
            .field("cache", &self.cache)
            .finish()
    }
}

impl Default for ParleyConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ParleyConfig {
    /// Defaults with no credential sources.
    pub fn new() -> Self {
        Self {
            model_name: DEFAULT_MODEL_NAME.to_string(),
            provider: ProviderKind::default(),
            api_key: None,
            env_api_key: None,
            secret_store: None,
            base_url: None,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            cache: CachePolicy::default(),
        }
    }

    /// Load from `.env`, the process environment and the default secrets file.
    pub fn load() -> Result<Self, ParleyError> {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        let secrets_path = std::env::var("PARLEY_SECRETS_FILE")
            .map(Into::into)
            .unwrap_or_else(|_| FileSecretStore::default_path());
        debug!(path = %secrets_path.display(), "secrets file");

        let store: Arc<dyn SecretStore> = Arc::new(FileSecretStore::new(secrets_path));
        Self::from_lookup(|name| std::env::var(name).ok())
            .map(|config| config.with_secret_store(Some(store)))
    }

    /// Build from an environment lookup function.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ParleyError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let mut config = Self::new();

        if let Some(model) = get("MODEL_NAME") {
            config.model_name = model;
        }
        if let Some(provider) = get("PARLEY_PROVIDER") {
            config.provider = provider.parse().map_err(|_| {
                ParleyError::Configuration(format!("Unknown provider '{provider}'"))
            })?;
        }
        config.env_api_key = get(config.provider.env_var());
        config.base_url = get("PARLEY_BASE_URL");

        if let Some(secs) = get("PARLEY_TIMEOUT_SECS") {
            config.request_timeout =
                Duration::from_secs(parse_number("PARLEY_TIMEOUT_SECS", &secs)?);
        }
        if let Some(secs) = get("PARLEY_CACHE_TTL_SECS") {
            config.cache.ttl =
                Duration::from_secs(parse_number("PARLEY_CACHE_TTL_SECS", &secs)?);
        }
        if let Some(capacity) = get("PARLEY_CACHE_CAPACITY") {
            config.cache.capacity = parse_number("PARLEY_CACHE_CAPACITY", &capacity)? as usize;
        }

        Ok(config)
    }

    pub fn with_secret_store(mut self, store: Option<Arc<dyn SecretStore>>) -> Self {
        self.secret_store = store;
        self
    }

    pub fn with_model_name(mut self, model_name: impl Into<String>) -> Self {
        self.model_name = model_name.into();
        self
    }

    pub fn with_provider(mut self, provider: ProviderKind) -> Self {
        self.provider = provider;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_cache_policy(mut self, cache: CachePolicy) -> Self {
        self.cache = cache;
        self
    }

    pub fn set_api_key(&mut self, key: impl Into<String>) {
        self.api_key = Some(key.into());
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn provider(&self) -> ProviderKind {
        self.provider
    }

    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    pub fn cache_policy(&self) -> CachePolicy {
        self.cache
    }

    /// Resolve the API key through the layers.
    pub fn api_key(&self) -> Result<Option<String>, ParleyError> {
        if let Some(key) = &self.api_key {
            return Ok(Some(key.clone()));
        }
        if let Some(store) = &self.secret_store {
            if let Some(key) = store.get(self.provider.secret_key())? {
                debug!(provider = %self.provider, "api key from secret store");
                return Ok(Some(key));
            }
        }
        Ok(self.env_api_key.clone())
    }

    /// Resolve the API key or fail with [`ParleyError::ConfigMissing`].
    pub fn require_api_key(&self) -> Result<String, ParleyError> {
        self.api_key()?.ok_or_else(|| {
            ParleyError::ConfigMissing(format!(
                "Missing {} API key. Set `{}` in secrets.toml or the `{}` environment variable.",
                self.provider,
                self.provider.secret_key(),
                self.provider.env_var()
            ))
        })
    }
}

fn parse_number(name: &str, value: &str) -> Result<u64, ParleyError> {
    value
        .parse()
        .map_err(|_| ParleyError::Configuration(format!("{name} must be a number, got '{value}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapStore(HashMap<&'static str, &'static str>);

    impl SecretStore for MapStore {
        fn get(&self, key: &str) -> Result<Option<String>, ParleyError> {
            Ok(self.0.get(key).map(|v| v.to_string()))
        }
    }

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults() {
        let config = ParleyConfig::from_lookup(env(&[])).unwrap();
        assert_eq!(config.model_name(), DEFAULT_MODEL_NAME);
        assert_eq!(config.provider(), ProviderKind::Together);
        assert_eq!(config.request_timeout(), Duration::from_secs(120));
        assert_eq!(config.cache_policy(), CachePolicy::default());
        assert_eq!(config.api_key().unwrap(), None);
    }

    #[test]
    fn secret_store_takes_precedence_over_env() {
        let store = MapStore(HashMap::from([("together_ai_api_key", "from-secrets")]));
        let config = ParleyConfig::from_lookup(env(&[("TOGETHER_API_KEY", "from-env")]))
            .unwrap()
            .with_secret_store(Some(Arc::new(store)));
        assert_eq!(config.require_api_key().unwrap(), "from-secrets");
    }

    #[test]
    fn explicit_key_takes_precedence_over_everything() {
        let store = MapStore(HashMap::from([("together_ai_api_key", "from-secrets")]));
        let mut config = ParleyConfig::from_lookup(env(&[("TOGETHER_API_KEY", "from-env")]))
            .unwrap()
            .with_secret_store(Some(Arc::new(store)));
        config.set_api_key("explicit");
        assert_eq!(config.require_api_key().unwrap(), "explicit");
    }

    #[test]
    fn env_is_the_last_layer() {
        let config = ParleyConfig::from_lookup(env(&[("TOGETHER_API_KEY", "from-env")]))
            .unwrap()
            .with_secret_store(Some(Arc::new(MapStore(HashMap::new()))));
        assert_eq!(config.require_api_key().unwrap(), "from-env");
    }

    #[test]
    fn provider_selects_credential_names() {
        let config = ParleyConfig::from_lookup(env(&[
            ("PARLEY_PROVIDER", "OpenAI"),
            ("TOGETHER_API_KEY", "wrong"),
            ("OPENAI_API_KEY", "right"),
        ]))
        .unwrap();
        assert_eq!(config.provider(), ProviderKind::OpenAi);
        assert_eq!(config.require_api_key().unwrap(), "right");
    }

    #[test]
    fn missing_key_is_config_missing() {
        let err = ParleyConfig::from_lookup(env(&[("TOGETHER_API_KEY", "   ")]))
            .unwrap()
            .require_api_key()
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::ConfigMissing);
        assert!(err.to_string().contains("TOGETHER_API_KEY"));
    }

    #[test]
    fn numeric_overrides_are_validated() {
        let config = ParleyConfig::from_lookup(env(&[
            ("PARLEY_TIMEOUT_SECS", "5"),
            ("PARLEY_CACHE_CAPACITY", "0"),
            ("MODEL_NAME", "meta-llama/Llama-3-8b"),
        ]))
        .unwrap();
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
        assert!(!config.cache_policy().is_enabled());
        assert_eq!(config.model_name(), "meta-llama/Llama-3-8b");

        let err = ParleyConfig::from_lookup(env(&[("PARLEY_TIMEOUT_SECS", "soon")])).unwrap_err();
        assert!(matches!(err, ParleyError::Configuration(_)));
    }

    #[test]
    fn debug_redacts_keys() {
        let mut config = ParleyConfig::new();
        config.set_api_key("sk-secret");
        assert!(!format!("{config:?}").contains("sk-secret"));
    }
}
