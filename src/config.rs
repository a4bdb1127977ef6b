use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Errors that can occur when loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read the config file.
    ReadFile { path: PathBuf, source: std::io::Error },
    /// Failed to parse JSON.
    ParseJson { path: PathBuf, source: serde_json::Error },
    /// Validation error.
    Validation(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadFile { path, source } => {
                write!(f, "failed to read config file '{}': {}", path.display(), source)
            }
            Self::ParseJson { path, source } => {
                write!(f, "failed to parse config file '{}': {}", path.display(), source)
            }
            Self::Validation(msg) => write!(f, "config validation error: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ReadFile { source, .. } => Some(source),
            Self::ParseJson { source, .. } => Some(source),
            Self::Validation(_) => None,
        }
    }
}

#[derive(Deserialize)]
struct ConfigFile {
    telegram_bot_token: String,
    anthropic_api_key: String,
    /// Gemini API key; when set, Gemini becomes the fallback provider.
    #[serde(default)]
    gemini_api_key: String,
    /// Chat that receives a copy of every inbound message's metadata.
    log_chat_id: Option<i64>,
    /// Chance of replying to a message that is not a reply to the bot.
    #[serde(default = "default_response_probability")]
    response_probability: f64,
    #[serde(default = "default_reply_delay_min_ms")]
    reply_delay_min_ms: u64,
    #[serde(default = "default_reply_delay_max_ms")]
    reply_delay_max_ms: u64,
    #[serde(default = "default_max_reply_tokens")]
    max_reply_tokens: u32,
    /// Larger token budget for technical messages. Unset = same budget.
    technical_max_tokens: Option<u32>,
    /// Directory for state files (logs). Defaults to current directory.
    data_dir: Option<String>,
}

fn default_response_probability() -> f64 {
    0.5
}

fn default_reply_delay_min_ms() -> u64 {
    500
}

fn default_reply_delay_max_ms() -> u64 {
    2000
}

fn default_max_reply_tokens() -> u32 {
    2000
}

pub struct Config {
    pub telegram_bot_token: String,
    pub anthropic_api_key: String,
    pub gemini_api_key: Option<String>,
    pub log_chat_id: Option<i64>,
    pub response_probability: f64,
    pub reply_delay_min: Duration,
    pub reply_delay_max: Duration,
    pub max_reply_tokens: u32,
    pub technical_max_tokens: Option<u32>,
    /// Directory for state files (logs).
    pub data_dir: PathBuf,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config_path = path.as_ref().to_path_buf();
        let content = std::fs::read_to_string(&config_path)
            .map_err(|e| ConfigError::ReadFile { path: config_path.clone(), source: e })?;
        let file: ConfigFile = serde_json::from_str(&content)
            .map_err(|e| ConfigError::ParseJson { path: config_path.clone(), source: e })?;

        // Validate required fields
        if file.telegram_bot_token.is_empty() {
            return Err(ConfigError::Validation("telegram_bot_token is required".into()));
        }
        // Telegram tokens are formatted as {bot_id}:{secret} where bot_id is numeric
        let token_parts: Vec<&str> = file.telegram_bot_token.split(':').collect();
        if token_parts.len() != 2 || token_parts[0].parse::<u64>().is_err() || token_parts[1].is_empty() {
            return Err(ConfigError::Validation(
                "telegram_bot_token appears invalid (expected format: 123456789:ABCdefGHI...)".into()
            ));
        }
        if file.anthropic_api_key.is_empty() {
            return Err(ConfigError::Validation("anthropic_api_key is required".into()));
        }
        if !(0.0..=1.0).contains(&file.response_probability) {
            return Err(ConfigError::Validation(format!(
                "response_probability must lie in [0, 1], got {}",
                file.response_probability
            )));
        }
        if file.reply_delay_min_ms > file.reply_delay_max_ms {
            return Err(ConfigError::Validation(format!(
                "reply_delay_min_ms ({}) must not exceed reply_delay_max_ms ({})",
                file.reply_delay_min_ms, file.reply_delay_max_ms
            )));
        }
        if file.max_reply_tokens == 0 {
            return Err(ConfigError::Validation("max_reply_tokens must be positive".into()));
        }

        let gemini_api_key = if file.gemini_api_key.is_empty() {
            None
        } else {
            Some(file.gemini_api_key)
        };

        let data_dir = file
            .data_dir
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));

        Ok(Self {
            telegram_bot_token: file.telegram_bot_token,
            anthropic_api_key: file.anthropic_api_key,
            gemini_api_key,
            log_chat_id: file.log_chat_id,
            response_probability: file.response_probability,
            reply_delay_min: Duration::from_millis(file.reply_delay_min_ms),
            reply_delay_max: Duration::from_millis(file.reply_delay_max_ms),
            max_reply_tokens: file.max_reply_tokens,
            technical_max_tokens: file.technical_max_tokens,
            data_dir,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn assert_err<T>(result: Result<T, ConfigError>) -> ConfigError {
        match result {
            Ok(_) => panic!("expected error, got Ok"),
            Err(e) => e,
        }
    }

    #[test]
    fn test_valid_config_with_defaults() {
        let file = write_config(r#"{
            "telegram_bot_token": "123456789:ABCdefGHIjklMNOpqrsTUVwxyz",
            "anthropic_api_key": "sk-test"
        }"#);
        let config = Config::load(file.path()).expect("should load valid config");
        assert_eq!(config.response_probability, 0.5);
        assert_eq!(config.reply_delay_min, Duration::from_millis(500));
        assert_eq!(config.reply_delay_max, Duration::from_millis(2000));
        assert_eq!(config.max_reply_tokens, 2000);
        assert!(config.gemini_api_key.is_none());
        assert!(config.log_chat_id.is_none());
        assert!(config.technical_max_tokens.is_none());
    }

    #[test]
    fn test_explicit_values_override_defaults() {
        let file = write_config(r#"{
            "telegram_bot_token": "123456789:ABCdef",
            "anthropic_api_key": "sk-test",
            "gemini_api_key": "g-test",
            "log_chat_id": -100987,
            "response_probability": 0.8,
            "reply_delay_min_ms": 100,
            "reply_delay_max_ms": 300,
            "max_reply_tokens": 1000,
            "technical_max_tokens": 4000
        }"#);
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.gemini_api_key.as_deref(), Some("g-test"));
        assert_eq!(config.log_chat_id, Some(-100987));
        assert_eq!(config.response_probability, 0.8);
        assert_eq!(config.reply_delay_min, Duration::from_millis(100));
        assert_eq!(config.reply_delay_max, Duration::from_millis(300));
        assert_eq!(config.max_reply_tokens, 1000);
        assert_eq!(config.technical_max_tokens, Some(4000));
    }

    #[test]
    fn test_empty_token() {
        let file = write_config(r#"{
            "telegram_bot_token": "",
            "anthropic_api_key": "sk-test"
        }"#);
        let err = assert_err(Config::load(file.path()));
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("telegram_bot_token"));
    }

    #[test]
    fn test_invalid_token_format_no_colon() {
        let file = write_config(r#"{
            "telegram_bot_token": "invalid_token_no_colon",
            "anthropic_api_key": "sk-test"
        }"#);
        let err = assert_err(Config::load(file.path()));
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("invalid"));
    }

    #[test]
    fn test_invalid_token_format_non_numeric_id() {
        let file = write_config(r#"{
            "telegram_bot_token": "notanumber:ABCdef",
            "anthropic_api_key": "sk-test"
        }"#);
        let err = assert_err(Config::load(file.path()));
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_missing_anthropic_key() {
        let file = write_config(r#"{
            "telegram_bot_token": "123456789:ABCdef",
            "anthropic_api_key": ""
        }"#);
        let err = assert_err(Config::load(file.path()));
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("anthropic_api_key"));
    }

    #[test]
    fn test_probability_out_of_range() {
        let file = write_config(r#"{
            "telegram_bot_token": "123456789:ABCdef",
            "anthropic_api_key": "sk-test",
            "response_probability": 1.5
        }"#);
        let err = assert_err(Config::load(file.path()));
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("response_probability"));
    }

    #[test]
    fn test_inverted_delay_bounds() {
        let file = write_config(r#"{
            "telegram_bot_token": "123456789:ABCdef",
            "anthropic_api_key": "sk-test",
            "reply_delay_min_ms": 3000,
            "reply_delay_max_ms": 1000
        }"#);
        let err = assert_err(Config::load(file.path()));
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("reply_delay_min_ms"));
    }

    #[test]
    fn test_zero_token_budget() {
        let file = write_config(r#"{
            "telegram_bot_token": "123456789:ABCdef",
            "anthropic_api_key": "sk-test",
            "max_reply_tokens": 0
        }"#);
        let err = assert_err(Config::load(file.path()));
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_file_not_found() {
        let err = assert_err(Config::load("/nonexistent/path/config.json"));
        assert!(matches!(err, ConfigError::ReadFile { .. }));
    }

    #[test]
    fn test_invalid_json() {
        let file = write_config("{ invalid json }");
        let err = assert_err(Config::load(file.path()));
        assert!(matches!(err, ConfigError::ParseJson { .. }));
    }
}
