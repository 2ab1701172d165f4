//! Configuration for the PaddleOCR HTTP client.

use std::time::Duration;

use url::Url;

use faktur_core::ocr::{Error, ErrorKind, Result};

/// Configuration for the PaddleOCR HTTP client.
///
/// # Examples
///
/// ```ignore
/// use faktur_paddle::PaddleConfig;
/// use std::time::Duration;
///
/// // Basic configuration
/// let config = PaddleConfig::new("http://localhost:8868")?;
///
/// // Advanced configuration
/// let config = PaddleConfig::builder()
///     .base_url("http://paddle-serving:8868")
///     .timeout(Duration::from_secs(60))
///     .api_key("my-secret-key")
///     .language("en")
///     .build()?;
/// ```
#[derive(Debug, Clone)]
pub struct PaddleConfig {
    /// Base URL of the serving endpoint
    base_url: Url,

    /// API key for authentication (if required)
    api_key: Option<String>,

    /// Request timeout duration
    timeout: Duration,

    /// Recognition language passed to the engine
    language: String,

    /// User agent string for HTTP requests
    user_agent: String,
}

impl PaddleConfig {
    /// Creates a new configuration with the given base URL and defaults.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        let base_url = Url::parse(base_url.as_ref()).map_err(|e| {
            Error::with_source(ErrorKind::InvalidInput, Box::new(e))
        })?;

        Ok(Self {
            base_url,
            api_key: None,
            timeout: Duration::from_secs(30),
            language: "en".to_string(),
            user_agent: format!("faktur-paddle/{}", env!("CARGO_PKG_VERSION")),
        })
    }

    /// Creates a new configuration builder.
    pub fn builder() -> PaddleConfigBuilder {
        PaddleConfigBuilder::default()
    }

    /// Base URL of the serving endpoint.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// API key, if configured.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    /// Request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Recognition language hint.
    pub fn language(&self) -> &str {
        &self.language
    }

    /// User agent string.
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the API key.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Sets the recognition language hint.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }
}

/// Builder for [`PaddleConfig`].
#[derive(Debug, Default)]
pub struct PaddleConfigBuilder {
    base_url: Option<String>,
    api_key: Option<String>,
    timeout: Option<Duration>,
    language: Option<String>,
}

impl PaddleConfigBuilder {
    /// Sets the base URL of the serving endpoint (required).
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Sets the API key.
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Sets the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the recognition language hint.
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns an invalid-input error when the base URL is missing or
    /// unparseable.
    pub fn build(self) -> Result<PaddleConfig> {
        let base_url = self.base_url.ok_or_else(Error::invalid_input)?;

        let mut config = PaddleConfig::new(base_url)?;
        if let Some(api_key) = self.api_key {
            config.api_key = Some(api_key);
        }
        if let Some(timeout) = self.timeout {
            config.timeout = timeout;
        }
        if let Some(language) = self.language {
            config.language = language;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = PaddleConfig::new("http://localhost:8868").unwrap();
        assert_eq!(config.language(), "en");
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert!(config.api_key().is_none());
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        assert!(PaddleConfig::new("not a url").is_err());
    }

    #[test]
    fn test_builder() {
        let config = PaddleConfig::builder()
            .base_url("http://paddle:8868")
            .api_key("secret")
            .timeout(Duration::from_secs(5))
            .language("de")
            .build()
            .unwrap();

        assert_eq!(config.base_url().as_str(), "http://paddle:8868/");
        assert_eq!(config.api_key(), Some("secret"));
        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert_eq!(config.language(), "de");
    }

    #[test]
    fn test_builder_requires_base_url() {
        assert!(PaddleConfig::builder().build().is_err());
    }
}
