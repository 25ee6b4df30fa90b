//! Server configuration parsed from environment variables.
//!
//! `.env` is loaded by `main` before this runs. Every variable is optional;
//! a value that is present but unparsable is an error rather than a silent
//! fallback, so a typo in `PORT` fails startup instead of binding elsewhere.
//! The LLM section is the one exception to "optional means defaulted": with
//! no API key it is `None` and the server runs without AI.

use std::str::FromStr;
use std::time::Duration;

use crate::error::ErrorCode;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_AI_MAX_TOKENS: u32 = 8192;
pub const DEFAULT_APP_NAME: &str = "Drawwy";
pub const DEFAULT_GATEWAY_URL: &str = "https://arweave.net";
pub const DEFAULT_GRAPHQL_URL: &str = "https://arweave.net/graphql";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 100 * 1024;
pub const DEFAULT_EXPORT_SCALE: u32 = 8;
/// Largest accepted PNG scale. A 64×64 grid at this scale is 4096 px square.
pub const MAX_EXPORT_SCALE: u32 = 64;
pub const DEFAULT_ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com/v1";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_LLM_REQUEST_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_LLM_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
    #[error("{var} must be one of {expected}, got {value:?}")]
    Unsupported { var: &'static str, value: String, expected: &'static str },
}

impl ErrorCode for ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Invalid { .. } => "E_CONFIG_INVALID",
            Self::Unsupported { .. } => "E_CONFIG_UNSUPPORTED",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    pub ai_max_tokens: u32,
    /// `App-Name` tag written on upload and filtered on in the gallery.
    pub app_name: String,
    pub gateway_url: String,
    pub graphql_url: String,
    /// Upload service endpoint. Publishing is disabled when unset.
    pub upload_url: Option<String>,
    pub upload_token: Option<String>,
    pub max_upload_bytes: usize,
    /// Pixels per cell in the published PNG.
    pub export_scale: u32,
    /// `None` when no API key is configured.
    pub llm: Option<LlmSettings>,
}

/// Which wire protocol the drawing assistant speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmBackend {
    /// Anthropic `/messages`.
    Anthropic,
    /// `OpenAI` `/responses`.
    OpenAiResponses,
    /// `OpenAI` `/chat/completions`, also spoken by most compatible gateways.
    OpenAiChatCompletions,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmSettings {
    pub backend: LlmBackend,
    pub api_key: String,
    pub model: String,
    /// API root without a trailing slash.
    pub base_url: String,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
}

impl LlmSettings {
    /// - `LLM_API_KEY_ENV` names the variable holding the key; unset or
    ///   empty on either side means no LLM.
    /// - `LLM_PROVIDER`: `anthropic` (default) or `openai`
    /// - `LLM_OPENAI_MODE`: `responses` (default) or `chat_completions`
    /// - `LLM_MODEL`, `LLM_BASE_URL`: provider defaults when absent
    /// - `LLM_REQUEST_TIMEOUT_SECS` (120), `LLM_CONNECT_TIMEOUT_SECS` (10)
    ///
    /// # Errors
    ///
    /// Unknown provider or mode, or a timeout that is not a positive integer.
    pub fn from_env() -> Result<Option<Self>, ConfigError> {
        let backend = match env_string("LLM_PROVIDER").as_deref().unwrap_or("anthropic") {
            "anthropic" => LlmBackend::Anthropic,
            "openai" => match env_string("LLM_OPENAI_MODE").as_deref().unwrap_or("responses") {
                "responses" => LlmBackend::OpenAiResponses,
                "chat_completions" => LlmBackend::OpenAiChatCompletions,
                other => {
                    return Err(ConfigError::Unsupported {
                        var: "LLM_OPENAI_MODE",
                        value: other.to_string(),
                        expected: "responses, chat_completions",
                    });
                }
            },
            other => {
                return Err(ConfigError::Unsupported {
                    var: "LLM_PROVIDER",
                    value: other.to_string(),
                    expected: "anthropic, openai",
                });
            }
        };
        let request_timeout = env_secs("LLM_REQUEST_TIMEOUT_SECS", DEFAULT_LLM_REQUEST_TIMEOUT_SECS)?;
        let connect_timeout = env_secs("LLM_CONNECT_TIMEOUT_SECS", DEFAULT_LLM_CONNECT_TIMEOUT_SECS)?;

        let Some(api_key) = env_string("LLM_API_KEY_ENV").and_then(|var| env_string(&var)) else {
            return Ok(None);
        };
        let (default_model, default_base) = match backend {
            LlmBackend::Anthropic => ("claude-haiku-4-5", DEFAULT_ANTHROPIC_BASE_URL),
            LlmBackend::OpenAiResponses | LlmBackend::OpenAiChatCompletions => ("gpt-4o-mini", DEFAULT_OPENAI_BASE_URL),
        };
        Ok(Some(Self {
            backend,
            api_key,
            model: env_string("LLM_MODEL").unwrap_or_else(|| default_model.to_string()),
            base_url: env_url("LLM_BASE_URL", default_base),
            request_timeout,
            connect_timeout,
        }))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            ai_max_tokens: DEFAULT_AI_MAX_TOKENS,
            app_name: DEFAULT_APP_NAME.to_string(),
            gateway_url: DEFAULT_GATEWAY_URL.to_string(),
            graphql_url: DEFAULT_GRAPHQL_URL.to_string(),
            upload_url: None,
            upload_token: None,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            export_scale: DEFAULT_EXPORT_SCALE,
            llm: None,
        }
    }
}

impl ServerConfig {
    /// Build typed server config from environment variables.
    ///
    /// - `PORT` (3000), `AI_MAX_TOKENS` (8192)
    /// - `DRAWWY_APP_NAME` (`Drawwy`)
    /// - `DRAWWY_GATEWAY_URL`, `DRAWWY_GRAPHQL_URL` (arweave.net)
    /// - `DRAWWY_UPLOAD_URL`, `DRAWWY_UPLOAD_TOKEN` (unset)
    /// - `DRAWWY_MAX_UPLOAD_BYTES` (102400), `DRAWWY_EXPORT_SCALE` (8, at most 64)
    /// - the LLM section, see [`LlmSettings::from_env`]
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a numeric variable does not parse, the
    /// export scale is outside `1..=64`, or the LLM section is invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let export_scale = env_parse("DRAWWY_EXPORT_SCALE", DEFAULT_EXPORT_SCALE)?;
        if !(1..=MAX_EXPORT_SCALE).contains(&export_scale) {
            return Err(ConfigError::Invalid { var: "DRAWWY_EXPORT_SCALE", value: export_scale.to_string() });
        }
        Ok(Self {
            port: env_parse("PORT", DEFAULT_PORT)?,
            ai_max_tokens: env_parse("AI_MAX_TOKENS", DEFAULT_AI_MAX_TOKENS)?,
            app_name: env_string("DRAWWY_APP_NAME").unwrap_or_else(|| DEFAULT_APP_NAME.to_string()),
            gateway_url: env_url("DRAWWY_GATEWAY_URL", DEFAULT_GATEWAY_URL),
            graphql_url: env_url("DRAWWY_GRAPHQL_URL", DEFAULT_GRAPHQL_URL),
            upload_url: env_string("DRAWWY_UPLOAD_URL"),
            upload_token: env_string("DRAWWY_UPLOAD_TOKEN"),
            max_upload_bytes: env_parse("DRAWWY_MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            export_scale,
            llm: LlmSettings::from_env()?,
        })
    }
}

/// Non-empty, trimmed value of `key`.
fn env_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_url(key: &str, default: &str) -> String {
    env_string(key)
        .unwrap_or_else(|| default.to_string())
        .trim_end_matches('/')
        .to_string()
}

fn env_parse<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env_string(key) {
        None => Ok(default),
        Some(raw) => raw
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { var: key, value: raw }),
    }
}

fn env_secs(key: &'static str, default: u64) -> Result<Duration, ConfigError> {
    match env_parse(key, default)? {
        0 => Err(ConfigError::Invalid { var: key, value: "0".into() }),
        secs => Ok(Duration::from_secs(secs)),
    }
}

/// Serialises tests that mutate process environment.
#[cfg(test)]
pub(crate) static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
