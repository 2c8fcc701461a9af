//! Configuration system using TOML.
//!
//! The host owns the configuration file; it hands us the text of our
//! section and we parse it here:
//!
//! ```toml
//! [ripsrc]
//! api_key = "..."
//! base_url = "https://api.example.com/tracks"
//! source_name = "ripsrc"      # optional
//! user_agent = "LavaSrc"      # optional
//! external = false
//!
//! [http]
//! connect_timeout_ms = 3000
//! request_timeout_ms = 10000
//! ```
//!
//! Optional values are resolved exactly once, by [`RipSrcConfig::resolve`],
//! into an immutable [`ResolverSettings`].

use serde::{Deserialize, Serialize};

/// Source name used when none is configured.
pub const DEFAULT_SOURCE_NAME: &str = "ripsrc";

/// User agent used when none is configured.
pub const DEFAULT_USER_AGENT: &str = "LavaSrc";

/// Plugin configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Catalog API settings
    pub ripsrc: RipSrcConfig,

    /// HTTP transport settings
    pub http: HttpConfig,
}

/// Catalog API settings, as written by the user
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RipSrcConfig {
    /// API key sent as the `p` query parameter
    pub api_key: Option<String>,

    /// Endpoint both query kinds are sent to
    pub base_url: Option<String>,

    /// Source name reported to the host (default: "ripsrc")
    pub source_name: Option<String>,

    /// User-Agent header (default: "LavaSrc")
    pub user_agent: Option<String>,

    /// Forwarded verbatim as the `external` parameter of ISRC lookups
    pub external: bool,
}

/// HTTP client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// TCP connect timeout
    pub connect_timeout_ms: u64,

    /// Whole-request timeout for JSON lookups (0 = none)
    pub request_timeout_ms: u64,

    /// How long idle pooled connections are kept
    pub pool_idle_timeout_ms: u64,

    /// Idle connections kept per host
    pub pool_max_idle_per_host: usize,

    /// Redirects followed before giving up
    pub max_redirects: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 3_000,
            request_timeout_ms: 10_000,
            pool_idle_timeout_ms: 90_000,
            pool_max_idle_per_host: 8,
            max_redirects: 5,
        }
    }
}

/// Fully-populated, immutable resolver configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverSettings {
    pub api_key: String,
    pub base_url: String,
    pub source_name: String,
    pub user_agent: String,
    pub external: bool,
}

impl ResolverSettings {
    /// Build settings, applying the defaults for unset optional values.
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        source_name: Option<String>,
        user_agent: Option<String>,
        external: bool,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into(),
            source_name: source_name.unwrap_or_else(|| DEFAULT_SOURCE_NAME.to_string()),
            user_agent: user_agent.unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            external,
        }
    }
}

impl RipSrcConfig {
    /// Resolve into immutable settings.
    ///
    /// `api_key` and `base_url` are required; every other value has a default.
    pub fn resolve(&self) -> Result<ResolverSettings, ConfigError> {
        let api_key = required(&self.api_key, "ripsrc.api_key")?;
        let base_url = required(&self.base_url, "ripsrc.base_url")?;

        Ok(ResolverSettings::new(
            api_key,
            base_url,
            self.source_name.clone().filter(|s| !s.trim().is_empty()),
            self.user_agent.clone().filter(|s| !s.trim().is_empty()),
            self.external,
        ))
    }
}

fn required(value: &Option<String>, key: &'static str) -> Result<String, ConfigError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or(ConfigError::Missing(key))
}

impl Config {
    /// Parse a TOML document supplied by the host.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config = toml::from_str(contents).map_err(ConfigError::Parse)?;
        tracing::debug!("Parsed ripsrc configuration");
        Ok(config)
    }

    /// Serialize back to pretty TOML.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required setting: {0}")]
    Missing(&'static str),

    #[error("Failed to parse config: {0}")]
    Parse(toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(toml::ser::Error),
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_serializes() {
        let config = Config::default();
        let toml = config.to_toml_string().unwrap();
        assert!(toml.contains("[ripsrc]"));
        assert!(toml.contains("[http]"));
    }

    #[test]
    fn test_defaults_applied_on_resolve() {
        let toml = r#"
[ripsrc]
api_key = "my-key"
base_url = "https://api.example.com/tracks"
"#;
        let settings = Config::from_toml_str(toml).unwrap().ripsrc.resolve().unwrap();

        assert_eq!(settings.api_key, "my-key");
        assert_eq!(settings.source_name, "ripsrc");
        assert_eq!(settings.user_agent, "LavaSrc");
        assert!(!settings.external);
    }

    #[test]
    fn test_explicit_values_kept() {
        let toml = r#"
[ripsrc]
api_key = "k"
base_url = "https://api"
source_name = "mirror"
user_agent = "MyBot/1.0"
external = true

[http]
connect_timeout_ms = 500
"#;
        let config = Config::from_toml_str(toml).unwrap();
        let settings = config.ripsrc.resolve().unwrap();

        assert_eq!(settings.source_name, "mirror");
        assert_eq!(settings.user_agent, "MyBot/1.0");
        assert!(settings.external);
        assert_eq!(config.http.connect_timeout_ms, 500);
        // Unspecified http fields use defaults
        assert_eq!(config.http.max_redirects, 5);
    }

    #[test]
    fn test_blank_optional_values_fall_back_to_defaults() {
        let config = RipSrcConfig {
            api_key: Some("k".to_string()),
            base_url: Some("https://api".to_string()),
            source_name: Some("  ".to_string()),
            user_agent: Some(String::new()),
            external: false,
        };
        let settings = config.resolve().unwrap();
        assert_eq!(settings.source_name, DEFAULT_SOURCE_NAME);
        assert_eq!(settings.user_agent, DEFAULT_USER_AGENT);
    }

    #[test]
    fn test_missing_api_key() {
        let config = RipSrcConfig {
            base_url: Some("https://api".to_string()),
            ..Default::default()
        };
        let err = config.resolve().unwrap_err();
        assert!(matches!(err, ConfigError::Missing("ripsrc.api_key")));
    }

    #[test]
    fn test_missing_base_url() {
        let config = RipSrcConfig {
            api_key: Some("k".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            config.resolve(),
            Err(ConfigError::Missing("ripsrc.base_url"))
        ));
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            Config::from_toml_str("[ripsrc\napi_key ="),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_config_roundtrip() {
        let mut config = Config::default();
        config.ripsrc.api_key = Some("test-key-123".to_string());
        config.ripsrc.external = true;
        config.http.pool_max_idle_per_host = 2;

        let toml = config.to_toml_string().unwrap();
        let parsed = Config::from_toml_str(&toml).unwrap();

        assert_eq!(parsed.ripsrc.api_key, Some("test-key-123".to_string()));
        assert!(parsed.ripsrc.external);
        assert_eq!(parsed.http.pool_max_idle_per_host, 2);
    }
}
