//! LLM provider implementations for termagent.
//!
//! All providers implement the `termagent_core::Provider` trait. Model
//! selection across candidates is handled by [`ModelFallback`], which the
//! agent loop owns and consults after each failed request.

pub mod fallback;
pub mod openai_compat;

pub use fallback::{FallbackState, ModelCandidate, ModelFallback};
pub use openai_compat::OpenAiCompatProvider;

use std::sync::Arc;
use std::time::Duration;
use termagent_config::AppConfig;
use termagent_core::error::ProviderError;
use termagent_core::provider::Provider;
use tracing::debug;

/// Build the endpoint client from configuration.
pub fn build_from_config(config: &AppConfig) -> Result<Arc<dyn Provider>, ProviderError> {
    let api_key = config
        .api_key
        .clone()
        .ok_or_else(|| ProviderError::NotConfigured("No API key configured".into()))?;

    let provider = OpenAiCompatProvider::new(
        "openai-compat",
        &config.base_url,
        api_key,
        Duration::from_secs(config.request_timeout_secs),
    )?;
    debug!(base_url = %provider.base_url(), "Provider configured");
    Ok(Arc::new(provider))
}

/// Build the fallback controller from the configured model list.
pub fn fallback_from_config(config: &AppConfig) -> Result<ModelFallback, ProviderError> {
    ModelFallback::from_names(config.models.iter().cloned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_requires_api_key() {
        let config = AppConfig::default();
        assert!(matches!(
            build_from_config(&config),
            Err(ProviderError::NotConfigured(_))
        ));
    }

    #[test]
    fn build_with_api_key() {
        let config = AppConfig {
            api_key: Some("key".into()),
            ..AppConfig::default()
        };
        let provider = build_from_config(&config).unwrap();
        assert_eq!(provider.name(), "openai-compat");
    }

    #[test]
    fn fallback_follows_configured_order() {
        let config = AppConfig {
            models: vec!["first".into(), "second".into()],
            ..AppConfig::default()
        };
        let fallback = fallback_from_config(&config).unwrap();
        assert_eq!(fallback.current_model().name, "first");
        assert_eq!(fallback.candidates().len(), 2);
    }
}
