use super::*;

const VARS: [&str; 18] = [
    "PORT",
    "AI_MAX_TOKENS",
    "DRAWWY_APP_NAME",
    "DRAWWY_GATEWAY_URL",
    "DRAWWY_GRAPHQL_URL",
    "DRAWWY_UPLOAD_URL",
    "DRAWWY_UPLOAD_TOKEN",
    "DRAWWY_MAX_UPLOAD_BYTES",
    "DRAWWY_EXPORT_SCALE",
    "LLM_PROVIDER",
    "LLM_MODEL",
    "LLM_API_KEY_ENV",
    "LLM_OPENAI_MODE",
    "LLM_BASE_URL",
    "LLM_REQUEST_TIMEOUT_SECS",
    "LLM_CONNECT_TIMEOUT_SECS",
    "DRAWWY_TEST_KEY",
    "OPENAI_API_KEY",
];

/// # Safety
/// Callers hold `ENV_LOCK`.
unsafe fn clear_server_env() {
    for var in VARS {
        unsafe { std::env::remove_var(var) };
    }
}

#[test]
fn from_env_defaults() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    unsafe { clear_server_env() };

    let cfg = ServerConfig::from_env().unwrap();
    assert_eq!(cfg, ServerConfig::default());
    assert_eq!(cfg.port, 3000);
    assert_eq!(cfg.max_upload_bytes, 102_400);
    assert!(cfg.upload_url.is_none());
}

#[test]
fn from_env_reads_overrides() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    unsafe {
        clear_server_env();
        std::env::set_var("PORT", "8080");
        std::env::set_var("AI_MAX_TOKENS", "1024");
        std::env::set_var("DRAWWY_APP_NAME", "Drawwy-Dev");
        std::env::set_var("DRAWWY_GATEWAY_URL", "https://gw.example/");
        std::env::set_var("DRAWWY_UPLOAD_URL", "https://up.example/tx");
        std::env::set_var("DRAWWY_UPLOAD_TOKEN", "  tok  ");
        std::env::set_var("DRAWWY_EXPORT_SCALE", "4");
    }

    let cfg = ServerConfig::from_env().unwrap();
    assert_eq!(cfg.port, 8080);
    assert_eq!(cfg.ai_max_tokens, 1024);
    assert_eq!(cfg.app_name, "Drawwy-Dev");
    assert_eq!(cfg.gateway_url, "https://gw.example");
    assert_eq!(cfg.upload_url.as_deref(), Some("https://up.example/tx"));
    assert_eq!(cfg.upload_token.as_deref(), Some("tok"));
    assert_eq!(cfg.export_scale, 4);

    unsafe { clear_server_env() };
}

#[test]
fn from_env_rejects_bad_port() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    unsafe {
        clear_server_env();
        std::env::set_var("PORT", "eighty");
    }

    let err = ServerConfig::from_env().unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { var: "PORT", .. }));
    assert_eq!(err.error_code(), "E_CONFIG_INVALID");

    unsafe { clear_server_env() };
}

#[test]
fn from_env_rejects_zero_scale() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    unsafe {
        clear_server_env();
        std::env::set_var("DRAWWY_EXPORT_SCALE", "0");
    }

    assert!(ServerConfig::from_env().is_err());

    unsafe { clear_server_env() };
}

#[test]
fn from_env_rejects_scale_above_limit() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    unsafe {
        clear_server_env();
        std::env::set_var("DRAWWY_EXPORT_SCALE", "65");
    }

    let err = ServerConfig::from_env().unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { var: "DRAWWY_EXPORT_SCALE", ref value } if value == "65"));

    unsafe {
        std::env::set_var("DRAWWY_EXPORT_SCALE", "64");
    }
    assert_eq!(ServerConfig::from_env().unwrap().export_scale, MAX_EXPORT_SCALE);

    unsafe { clear_server_env() };
}

// =============================================================================
// LLM section
// =============================================================================

#[test]
fn llm_absent_without_key() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    unsafe {
        clear_server_env();
        std::env::set_var("LLM_API_KEY_ENV", "DRAWWY_TEST_KEY");
    }

    assert_eq!(ServerConfig::from_env().unwrap().llm, None);

    unsafe { clear_server_env() };
}

#[test]
fn llm_defaults_to_anthropic() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    unsafe {
        clear_server_env();
        std::env::set_var("LLM_API_KEY_ENV", "DRAWWY_TEST_KEY");
        std::env::set_var("DRAWWY_TEST_KEY", "secret");
    }

    let llm = ServerConfig::from_env().unwrap().llm.unwrap();
    assert_eq!(llm.backend, LlmBackend::Anthropic);
    assert_eq!(llm.api_key, "secret");
    assert_eq!(llm.model, "claude-haiku-4-5");
    assert_eq!(llm.base_url, DEFAULT_ANTHROPIC_BASE_URL);
    assert_eq!(llm.request_timeout, Duration::from_secs(DEFAULT_LLM_REQUEST_TIMEOUT_SECS));
    assert_eq!(llm.connect_timeout, Duration::from_secs(DEFAULT_LLM_CONNECT_TIMEOUT_SECS));

    unsafe { clear_server_env() };
}

#[test]
fn llm_reads_openai_overrides() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    unsafe {
        clear_server_env();
        std::env::set_var("LLM_PROVIDER", "openai");
        std::env::set_var("LLM_OPENAI_MODE", "chat_completions");
        std::env::set_var("LLM_API_KEY_ENV", "OPENAI_API_KEY");
        std::env::set_var("OPENAI_API_KEY", "sk-test");
        std::env::set_var("LLM_BASE_URL", "https://gateway.test/v1/");
        std::env::set_var("LLM_REQUEST_TIMEOUT_SECS", "42");
    }

    let llm = ServerConfig::from_env().unwrap().llm.unwrap();
    assert_eq!(llm.backend, LlmBackend::OpenAiChatCompletions);
    assert_eq!(llm.model, "gpt-4o-mini");
    assert_eq!(llm.base_url, "https://gateway.test/v1");
    assert_eq!(llm.request_timeout, Duration::from_secs(42));

    unsafe { clear_server_env() };
}

#[test]
fn llm_rejects_unknown_provider_and_mode() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    unsafe {
        clear_server_env();
        std::env::set_var("LLM_PROVIDER", "bard");
    }
    let err = ServerConfig::from_env().unwrap_err();
    assert!(matches!(err, ConfigError::Unsupported { var: "LLM_PROVIDER", .. }));
    assert_eq!(err.error_code(), "E_CONFIG_UNSUPPORTED");

    unsafe {
        std::env::set_var("LLM_PROVIDER", "openai");
        std::env::set_var("LLM_OPENAI_MODE", "assistants");
    }
    let err = ServerConfig::from_env().unwrap_err();
    assert!(matches!(err, ConfigError::Unsupported { var: "LLM_OPENAI_MODE", .. }));

    unsafe { clear_server_env() };
}

#[test]
fn llm_rejects_zero_timeout() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    unsafe {
        clear_server_env();
        std::env::set_var("LLM_CONNECT_TIMEOUT_SECS", "0");
    }

    let err = ServerConfig::from_env().unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { var: "LLM_CONNECT_TIMEOUT_SECS", .. }));

    unsafe { clear_server_env() };
}

#[test]
fn blank_values_count_as_unset() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    unsafe {
        clear_server_env();
        std::env::set_var("DRAWWY_UPLOAD_URL", "   ");
        std::env::set_var("PORT", "");
    }

    let cfg = ServerConfig::from_env().unwrap();
    assert!(cfg.upload_url.is_none());
    assert_eq!(cfg.port, DEFAULT_PORT);

    unsafe { clear_server_env() };
}
