//! Configuration file parser for ~/.config/stockroom/config.toml.
//!
//! The config file is optional; a missing file yields `Config::default()`.
//! Unknown keys are silently ignored by serde (with `deny_unknown_fields` off),
//! though we log a warning when the file contains potential typos.
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Environment variable that overrides `api_token` from the file.
pub const TOKEN_ENV_VAR: &str = "STOCKROOM_API_TOKEN";

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config file exceeds maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),

    #[error("Invalid api_base_url '{0}': {1}")]
    InvalidBaseUrl(String, url::ParseError),

    #[error("Invalid setting: {0}")]
    Invalid(String),
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Top-level configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
/// Missing keys fall back to `Default::default()`.
///
/// Custom Debug impl masks `api_token`.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root of the inventory API, e.g. `https://inventory.example.com/api`.
    pub api_base_url: String,

    /// Bearer token sent with list requests.
    /// `STOCKROOM_API_TOKEN` takes precedence over this value.
    pub api_token: Option<String>,

    /// Items requested per page.
    pub page_limit: u32,

    /// Quiet interval before search text is sent, in milliseconds.
    pub search_debounce_ms: u64,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Scroll-to-top thresholds keyed by screen name ("products", "inventory", "audit").
    pub scroll_thresholds: HashMap<String, f64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "https://localhost:8000/api".to_string(),
            api_token: None,
            page_limit: 50,
            search_debounce_ms: 500,
            request_timeout_secs: 20,
            scroll_thresholds: HashMap::new(),
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_base_url", &self.api_base_url)
            .field("api_token", &self.api_token.as_ref().map(|_| "[REDACTED]"))
            .field("page_limit", &self.page_limit)
            .field("search_debounce_ms", &self.search_debounce_ms)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("scroll_thresholds", &self.scroll_thresholds)
            .finish()
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 6] = [
        "api_base_url",
        "api_token",
        "page_limit",
        "search_debounce_ms",
        "request_timeout_secs",
        "scroll_thresholds",
    ];

    /// Default location: `$HOME/.config/stockroom/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        let home = std::env::var_os("HOME")?;
        Some(
            PathBuf::from(home)
                .join(".config")
                .join("stockroom")
                .join("config.toml"),
        )
    }

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → silently accepted (serde default behavior), logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        // Check file size before reading to avoid loading a runaway file
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // File deleted between metadata and read
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        tracing::info!(
            path = %path.display(),
            api_base_url = %config.api_base_url,
            page_limit = config.page_limit,
            "Loaded configuration"
        );
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        url::Url::parse(&self.api_base_url)
            .map_err(|e| ConfigError::InvalidBaseUrl(self.api_base_url.clone(), e))?;
        if self.page_limit == 0 {
            return Err(ConfigError::Invalid("page_limit must be at least 1".into()));
        }
        if let Some((screen, px)) = self
            .scroll_thresholds
            .iter()
            .find(|(_, px)| !px.is_finite() || **px < 0.0)
        {
            return Err(ConfigError::Invalid(format!(
                "scroll_thresholds.{screen} must be a non-negative number, got {px}"
            )));
        }
        Ok(())
    }

    /// Token from the environment, falling back to the file.
    pub fn resolved_token(&self) -> Option<String> {
        std::env::var(TOKEN_ENV_VAR)
            .ok()
            .filter(|t| !t.trim().is_empty())
            .or_else(|| self.api_token.clone())
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    /// Scroll-to-top threshold for `screen`, or `default` when not configured.
    pub fn scroll_threshold(&self, screen: &str, default: f64) -> f64 {
        self.scroll_thresholds.get(screen).copied().unwrap_or(default)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(name: &str, content: &str) -> (PathBuf, PathBuf) {
        let dir = std::env::temp_dir().join(format!("stockroom_config_test_{name}"));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.page_limit, 50);
        assert_eq!(config.search_debounce_ms, 500);
        assert_eq!(config.search_debounce(), Duration::from_millis(500));
        assert_eq!(config.request_timeout_secs, 20);
        assert!(config.api_token.is_none());
        assert!(config.scroll_thresholds.is_empty());
    }

    #[test]
    fn test_missing_file_returns_default() {
        let path = Path::new("/tmp/stockroom_test_nonexistent_config.toml");
        let config = Config::load(path).unwrap();
        assert_eq!(config.page_limit, 50);
    }

    #[test]
    fn test_whitespace_only_file_returns_default() {
        let (dir, path) = write_config("whitespace", "   \n  \n  ");
        let config = Config::load(&path).unwrap();
        assert_eq!(config.search_debounce_ms, 500);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_full_config() {
        let content = r#"
api_base_url = "https://inventory.example.com/api"
api_token = "file-token"
page_limit = 25
search_debounce_ms = 300
request_timeout_secs = 10

[scroll_thresholds]
products = 250.0
audit = 90.0
"#;
        let (dir, path) = write_config("full", content);
        let config = Config::load(&path).unwrap();
        assert_eq!(config.api_base_url, "https://inventory.example.com/api");
        assert_eq!(config.api_token.as_deref(), Some("file-token"));
        assert_eq!(config.page_limit, 25);
        assert_eq!(config.search_debounce_ms, 300);
        assert_eq!(config.request_timeout_secs, 10);
        assert_eq!(config.scroll_threshold("products", 300.0), 250.0);
        assert_eq!(config.scroll_threshold("inventory", 200.0), 200.0);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_partial_config_uses_defaults_for_missing() {
        let (dir, path) = write_config("partial", "page_limit = 10\n");
        let config = Config::load(&path).unwrap();
        assert_eq!(config.page_limit, 10);
        assert_eq!(config.search_debounce_ms, 500);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let (dir, path) = write_config("invalid", "this is not [valid toml");
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().contains("Invalid TOML"));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_unknown_keys_accepted() {
        let (dir, path) = write_config("unknown", "page_limit = 20\ntheme = \"dark\"\n");
        let config = Config::load(&path).unwrap();
        assert_eq!(config.page_limit, 20);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_zero_page_limit_rejected() {
        let (dir, path) = write_config("zero_limit", "page_limit = 0\n");
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_bad_base_url_rejected() {
        let (dir, path) = write_config("bad_url", "api_base_url = \"not a url\"\n");
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBaseUrl(..)));
        std::fs::remove_dir_all(&dir).ok();
    }

    /// Sets the token variable for one test and restores it on drop.
    struct TokenEnvGuard {
        previous: Option<String>,
        _lock: std::sync::MutexGuard<'static, ()>,
    }

    static TOKEN_ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

    impl TokenEnvGuard {
        fn set(value: Option<&str>) -> Self {
            let lock = TOKEN_ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
            let previous = std::env::var(TOKEN_ENV_VAR).ok();
            match value {
                Some(v) => std::env::set_var(TOKEN_ENV_VAR, v),
                None => std::env::remove_var(TOKEN_ENV_VAR),
            }
            Self {
                previous,
                _lock: lock,
            }
        }
    }

    impl Drop for TokenEnvGuard {
        fn drop(&mut self) {
            match &self.previous {
                Some(v) => std::env::set_var(TOKEN_ENV_VAR, v),
                None => std::env::remove_var(TOKEN_ENV_VAR),
            }
        }
    }

    #[test]
    fn test_env_token_takes_precedence() {
        let config = Config {
            api_token: Some("file-token".into()),
            ..Config::default()
        };

        let _env = TokenEnvGuard::set(Some("env-token"));
        assert_eq!(config.resolved_token().as_deref(), Some("env-token"));
    }

    #[test]
    fn test_blank_env_token_falls_back_to_file() {
        let config = Config {
            api_token: Some("file-token".into()),
            ..Config::default()
        };

        let _env = TokenEnvGuard::set(Some("   "));
        assert_eq!(config.resolved_token().as_deref(), Some("file-token"));
    }

    #[test]
    fn test_no_token_anywhere() {
        let _env = TokenEnvGuard::set(None);
        assert_eq!(Config::default().resolved_token(), None);
    }

    #[test]
    fn test_negative_threshold_rejected() {
        let (dir, path) = write_config("neg_threshold", "[scroll_thresholds]\naudit = -5.0\n");
        let err = Config::load(&path).unwrap_err();
        assert!(err.to_string().contains("scroll_thresholds.audit"));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_too_large_file_rejected() {
        let (dir, path) = write_config("too_large", &"a".repeat(1_048_577));
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::TooLarge(_)));
        assert!(err.to_string().contains("too large"));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_debug_masks_api_token() {
        let config = Config {
            api_token: Some("super-secret-token-12345".to_string()),
            ..Config::default()
        };
        let debug_output = format!("{:?}", config);
        assert!(!debug_output.contains("super-secret-token-12345"));
        assert!(debug_output.contains("[REDACTED]"));
    }
}
