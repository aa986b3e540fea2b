use std::net::SocketAddr;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Defines the supported backends for LLM translation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Provider {
    OpenAI,
    Gemini,
}

pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1/";
/// Base URL of Gemini's OpenAI-compatible endpoint.
pub const GEMINI_OPENAI_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/openai";

const DEFAULT_DATABASE_URL: &str = "sqlite://data/ubuntu_lingo.db?mode=rwc";

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub provider: Provider,
    pub openai_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub google_translate_api_key: Option<String>,
    pub chat_model: String,
    pub tts_model: String,
    pub tts_voice: String,
    pub log_level: Level,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// API keys are optional; a missing key only disables the capability that
    /// needs it. The exception is the `gemini` provider, which is useless
    /// without its key.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let database_url =
            std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());

        let provider_str = std::env::var("AI_PROVIDER").unwrap_or_else(|_| "openai".to_string());
        let provider = match provider_str.to_lowercase().as_str() {
            "gemini" => Provider::Gemini,
            "openai" => Provider::OpenAI,
            other => {
                return Err(ConfigError::InvalidValue(
                    "AI_PROVIDER".to_string(),
                    format!("'{}' is not one of 'openai' or 'gemini'", other),
                ));
            }
        };

        let openai_api_key = non_empty_var("OPENAI_API_KEY");
        let gemini_api_key = non_empty_var("GEMINI_API_KEY");
        let google_translate_api_key = non_empty_var("GOOGLE_TRANSLATE_API_KEY");

        if provider == Provider::Gemini && gemini_api_key.is_none() {
            return Err(ConfigError::MissingVar(
                "GEMINI_API_KEY must be set for 'gemini' provider".to_string(),
            ));
        }

        let default_chat_model = match provider {
            Provider::OpenAI => "gpt-4o-mini",
            Provider::Gemini => "gemini-2.0-flash",
        };
        let chat_model =
            std::env::var("CHAT_MODEL").unwrap_or_else(|_| default_chat_model.to_string());
        let tts_model = std::env::var("TTS_MODEL").unwrap_or_else(|_| "tts-1".to_string());
        let tts_voice = std::env::var("TTS_VOICE").unwrap_or_else(|_| "alloy".to_string());

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        Ok(Self {
            bind_address,
            database_url,
            provider,
            openai_api_key,
            gemini_api_key,
            google_translate_api_key,
            chat_model,
            tts_model,
            tts_voice,
            log_level,
        })
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;
    use tracing::Level;

    fn clear_env_vars() {
        unsafe {
            env::remove_var("BIND_ADDRESS");
            env::remove_var("DATABASE_URL");
            env::remove_var("AI_PROVIDER");
            env::remove_var("OPENAI_API_KEY");
            env::remove_var("GEMINI_API_KEY");
            env::remove_var("GOOGLE_TRANSLATE_API_KEY");
            env::remove_var("CHAT_MODEL");
            env::remove_var("TTS_MODEL");
            env::remove_var("TTS_VOICE");
            env::remove_var("RUST_LOG");
        }
    }

    #[test]
    fn test_config_error_display() {
        let missing_var = ConfigError::MissingVar("TEST_VAR".to_string());
        assert_eq!(
            format!("{}", missing_var),
            "Missing environment variable: TEST_VAR"
        );

        let invalid_value =
            ConfigError::InvalidValue("TEST_VAR".to_string(), "bad_value".to_string());
        assert_eq!(
            format!("{}", invalid_value),
            "Invalid value for environment variable TEST_VAR: bad_value"
        );
    }

    #[test]
    #[serial]
    fn test_config_defaults_without_keys() {
        clear_env_vars();

        let config = Config::from_env().expect("Config should load successfully");

        assert_eq!(config.bind_address.to_string(), "0.0.0.0:3000");
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.provider, Provider::OpenAI);
        assert_eq!(config.openai_api_key, None);
        assert_eq!(config.google_translate_api_key, None);
        assert_eq!(config.chat_model, "gpt-4o-mini");
        assert_eq!(config.tts_model, "tts-1");
        assert_eq!(config.tts_voice, "alloy");
        assert_eq!(config.log_level, Level::INFO);
    }

    #[test]
    #[serial]
    fn test_config_from_env_custom_values() {
        clear_env_vars();
        unsafe {
            env::set_var("BIND_ADDRESS", "127.0.0.1:8080");
            env::set_var("DATABASE_URL", "sqlite::memory:");
            env::set_var("AI_PROVIDER", "openai");
            env::set_var("OPENAI_API_KEY", "custom-openai-key");
            env::set_var("GOOGLE_TRANSLATE_API_KEY", "custom-google-key");
            env::set_var("CHAT_MODEL", "gpt-4o");
            env::set_var("TTS_VOICE", "nova");
            env::set_var("RUST_LOG", "debug");
        }

        let config = Config::from_env().expect("Config should load successfully");

        assert_eq!(config.bind_address.to_string(), "127.0.0.1:8080");
        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.openai_api_key, Some("custom-openai-key".to_string()));
        assert_eq!(
            config.google_translate_api_key,
            Some("custom-google-key".to_string())
        );
        assert_eq!(config.chat_model, "gpt-4o");
        assert_eq!(config.tts_voice, "nova");
        assert_eq!(config.log_level, Level::DEBUG);
    }

    #[test]
    #[serial]
    fn test_config_gemini_provider() {
        clear_env_vars();
        unsafe {
            env::set_var("AI_PROVIDER", "Gemini");
            env::set_var("GEMINI_API_KEY", "test-gemini-key");
        }

        let config = Config::from_env().expect("Config should load successfully");
        assert_eq!(config.provider, Provider::Gemini);
        assert_eq!(config.gemini_api_key, Some("test-gemini-key".to_string()));
        assert_eq!(config.chat_model, "gemini-2.0-flash");
    }

    #[test]
    #[serial]
    fn test_config_missing_gemini_key() {
        clear_env_vars();
        unsafe {
            env::set_var("AI_PROVIDER", "gemini");
            env::set_var("GEMINI_API_KEY", "  ");
        }

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::MissingVar(msg) => assert!(msg.contains("GEMINI_API_KEY")),
            _ => panic!("Expected MissingVar for GEMINI_API_KEY"),
        }
    }

    #[test]
    #[serial]
    fn test_config_invalid_values() {
        clear_env_vars();
        unsafe {
            env::set_var("BIND_ADDRESS", "not-a-valid-address");
        }
        match Config::from_env().unwrap_err() {
            ConfigError::InvalidValue(var, _) => assert_eq!(var, "BIND_ADDRESS"),
            _ => panic!("Expected InvalidValue for BIND_ADDRESS"),
        }

        clear_env_vars();
        unsafe {
            env::set_var("RUST_LOG", "not-a-level");
        }
        match Config::from_env().unwrap_err() {
            ConfigError::InvalidValue(var, _) => assert_eq!(var, "RUST_LOG"),
            _ => panic!("Expected InvalidValue for RUST_LOG"),
        }

        clear_env_vars();
        unsafe {
            env::set_var("AI_PROVIDER", "watson");
        }
        match Config::from_env().unwrap_err() {
            ConfigError::InvalidValue(var, _) => assert_eq!(var, "AI_PROVIDER"),
            _ => panic!("Expected InvalidValue for AI_PROVIDER"),
        }
    }
}
