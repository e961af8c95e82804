use crate::error::{Error, Result};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Messages endpoint used when none is configured.
pub const DEFAULT_API_URL: &str = "https://api.anthropic.com/v1/messages";

/// Model requested when none is configured.
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

/// API version header sent with every request.
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

const DEFAULT_MAX_TOKENS: u32 = 4096;
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Configuration for generation and export.
///
/// Use [`Config::builder()`] to construct a new configuration.
#[derive(Clone)]
#[non_exhaustive]
pub struct Config {
    /// Messages endpoint URL
    pub api_url: String,

    /// API key sent as `x-api-key`
    pub api_key: Option<String>,

    /// Model identifier
    pub model: String,

    /// Upper bound on generated tokens
    pub max_tokens: u32,

    /// Time allowed for one generation request
    pub timeout: Duration,

    /// Path to a prompt template replacing the built-in one
    pub template_path: Option<PathBuf>,

    /// Directory exported files are written to
    pub export_dir: PathBuf,

    /// Keep a timestamped copy of files overwritten by an export
    pub backup_existing: bool,
}

impl Config {
    /// Creates a new configuration builder.
    ///
    /// # Examples
    ///
    /// ```
    /// use notegen::Config;
    ///
    /// let config = Config::builder()
    ///     .api_key("sk-test")
    ///     .max_tokens(2048)
    ///     .build()
    ///     .expect("valid configuration");
    /// ```
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The endpoint is not an http(s) URL
    /// - The model is empty
    /// - Token limit or timeout is zero
    /// - The template path does not point to a file
    pub fn validate(&self) -> Result<()> {
        if !(self.api_url.starts_with("https://") || self.api_url.starts_with("http://")) {
            return Err(Error::config(format!(
                "api_url must be an http(s) URL: {}",
                self.api_url
            )));
        }

        if self.model.trim().is_empty() {
            return Err(Error::config("model must not be empty"));
        }

        if self.max_tokens == 0 {
            return Err(Error::config("max_tokens must be greater than 0"));
        }

        if self.timeout.is_zero() {
            return Err(Error::config("timeout must be greater than 0"));
        }

        if let Some(ref template_path) = self.template_path {
            if !template_path.is_file() {
                return Err(Error::config(format!(
                    "Template file does not exist: {}",
                    template_path.display()
                )));
            }
        }

        if self.api_key.as_deref().is_some_and(|k| k.trim().is_empty()) {
            tracing::warn!("api_key is set but empty; requests will be rejected");
        }

        Ok(())
    }

    /// Returns the API key or a configuration error naming the variable to set.
    ///
    /// # Errors
    ///
    /// Returns an error when no key is configured.
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| Error::config("ANTHROPIC_API_KEY is not set"))
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_url", &self.api_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("timeout", &self.timeout)
            .field("template_path", &self.template_path)
            .field("export_dir", &self.export_dir)
            .field("backup_existing", &self.backup_existing)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            template_path: None,
            export_dir: PathBuf::from("."),
            backup_existing: true,
        }
    }
}

/// Builder for creating a [`Config`].
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    api_url: Option<String>,
    api_key: Option<String>,
    model: Option<String>,
    max_tokens: Option<u32>,
    timeout: Option<Duration>,
    template_path: Option<PathBuf>,
    export_dir: Option<PathBuf>,
    backup_existing: Option<bool>,
}

impl ConfigBuilder {
    /// Sets the messages endpoint URL.
    #[must_use]
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = Some(url.into());
        self
    }

    /// Sets the API key.
    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the model identifier.
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets the maximum number of generated tokens.
    #[must_use]
    pub fn max_tokens(mut self, tokens: u32) -> Self {
        self.max_tokens = Some(tokens);
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the path to a custom prompt template.
    ///
    /// The template is validated when the prompt assembler loads it.
    #[must_use]
    pub fn template_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.template_path = Some(path.into());
        self
    }

    /// Sets the directory exports are written to.
    #[must_use]
    pub fn export_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.export_dir = Some(path.into());
        self
    }

    /// Enables or disables backup creation on export.
    #[must_use]
    pub fn backup_existing(mut self, enabled: bool) -> Self {
        self.backup_existing = Some(enabled);
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails.
    pub fn build(self) -> Result<Config> {
        let defaults = Config::default();
        let config = Config {
            api_url: self.api_url.unwrap_or(defaults.api_url),
            api_key: self.api_key,
            model: self.model.unwrap_or(defaults.model),
            max_tokens: self.max_tokens.unwrap_or(defaults.max_tokens),
            timeout: self.timeout.unwrap_or(defaults.timeout),
            template_path: self.template_path,
            export_dir: self.export_dir.unwrap_or(defaults.export_dir),
            backup_existing: self.backup_existing.unwrap_or(defaults.backup_existing),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::builder().build().unwrap();

        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.max_tokens, DEFAULT_MAX_TOKENS);
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[test]
    fn test_invalid_url() {
        let result = Config::builder().api_url("ftp://example.com").build();
        assert!(result.unwrap_err().is_config());
    }

    #[test]
    fn test_zero_limits() {
        assert!(Config::builder().max_tokens(0).build().is_err());
        assert!(Config::builder().timeout(Duration::ZERO).build().is_err());
    }

    #[test]
    fn test_missing_template() {
        let result = Config::builder()
            .template_path("/nonexistent/template.tera")
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_require_api_key() {
        let config = Config::builder().build().unwrap();
        assert!(config.require_api_key().is_err());

        let config = Config::builder().api_key("sk-test").build().unwrap();
        assert_eq!(config.require_api_key().unwrap(), "sk-test");
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = Config::builder().api_key("sk-secret").build().unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("<redacted>"));
    }
}
