use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

use crate::error::SignalError;
use crate::signal::rate_limit::{DEFAULT_BARE_MAX_CHARS, DEFAULT_BUFFER_SECS};

pub const CONFIG_PATH_ENV: &str = "RALPH_SIGNALS_CONFIG_PATH";
pub const BUFFER_SECS_ENV: &str = "RALPH_SIGNALS_BUFFER_SECS";
pub const BARE_MAX_CHARS_ENV: &str = "RALPH_SIGNALS_BARE_MAX_CHARS";
pub const AUDIT_ENABLED_ENV: &str = "RALPH_SIGNALS_AUDIT_ENABLED";
pub const AUDIT_LOG_ENV: &str = "RALPH_SIGNALS_AUDIT_LOG";

/// Environment variables that override file or default settings.
pub const ENV_OVERRIDE_KEYS: [&str; 4] = [
    BUFFER_SECS_ENV,
    BARE_MAX_CHARS_ENV,
    AUDIT_ENABLED_ENV,
    AUDIT_LOG_ENV,
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitSettings {
    #[serde(default = "default_buffer_secs")]
    pub buffer_secs: u64,
    #[serde(default = "default_bare_max_chars")]
    pub bare_max_chars: usize,
}

fn default_buffer_secs() -> u64 {
    DEFAULT_BUFFER_SECS
}

fn default_bare_max_chars() -> usize {
    DEFAULT_BARE_MAX_CHARS
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            buffer_secs: DEFAULT_BUFFER_SECS,
            bare_max_chars: DEFAULT_BARE_MAX_CHARS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuditSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub log_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SignalsConfig {
    pub rate_limit: RateLimitSettings,
    pub audit: AuditSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PartialSignalsConfig {
    rate_limit: Option<RateLimitSettings>,
    audit: Option<AuditSettings>,
}

fn env_or_u64(var: &str, fallback: u64) -> u64 {
    match env::var(var) {
        Ok(v) => v.trim().parse::<u64>().ok().unwrap_or(fallback),
        Err(_) => fallback,
    }
}

fn env_or_usize(var: &str, fallback: usize) -> usize {
    match env::var(var) {
        Ok(v) => v.trim().parse::<usize>().ok().unwrap_or(fallback),
        Err(_) => fallback,
    }
}

fn env_or_bool(var: &str, fallback: bool) -> bool {
    match env::var(var) {
        Ok(v) => {
            let trimmed = v.trim();
            match trimmed {
                "1" | "true" | "TRUE" | "yes" | "on" => true,
                "0" | "false" | "FALSE" | "no" | "off" => false,
                _ => fallback,
            }
        }
        Err(_) => fallback,
    }
}

fn env_or_optional_string(var: &str, fallback: Option<String>) -> Option<String> {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => Some(v.trim().to_string()),
        _ => fallback,
    }
}

fn validate(cfg: &SignalsConfig) -> Result<()> {
    if cfg.rate_limit.buffer_secs == 0 {
        return Err(SignalError::InvalidConfig(
            "rate limit buffer must be >= 1 second".to_string(),
        )
        .into());
    }
    if cfg.rate_limit.buffer_secs > 86_400 {
        return Err(SignalError::InvalidConfig(
            "rate limit buffer must be <= 86400 seconds".to_string(),
        )
        .into());
    }
    if cfg.rate_limit.bare_max_chars == 0 {
        return Err(SignalError::InvalidConfig(
            "bare pattern max chars must be >= 1".to_string(),
        )
        .into());
    }
    let has_log_path = cfg
        .audit
        .log_path
        .as_deref()
        .is_some_and(|p| !p.trim().is_empty());
    if cfg.audit.enabled && !has_log_path {
        return Err(SignalError::InvalidConfig(
            "audit enabled but no log path set (RALPH_SIGNALS_AUDIT_LOG)".to_string(),
        )
        .into());
    }
    Ok(())
}

pub fn resolve_config_path() -> Option<PathBuf> {
    if let Ok(custom) = env::var(CONFIG_PATH_ENV) {
        let trimmed = custom.trim();
        if !trimmed.is_empty() {
            return Some(PathBuf::from(trimmed));
        }
    }

    let home = dirs::home_dir()?;
    Some(home.join(".ralph-loop").join("signals.toml"))
}

fn merge_toml(base: &mut SignalsConfig, raw: &str) -> Result<()> {
    let parsed: PartialSignalsConfig = toml::from_str(raw)?;
    if let Some(rate_limit) = parsed.rate_limit {
        base.rate_limit = rate_limit;
    }
    if let Some(audit) = parsed.audit {
        base.audit = audit;
    }
    Ok(())
}

fn merge_file_config(base: &mut SignalsConfig) -> Result<()> {
    let Some(path) = resolve_config_path() else {
        return Ok(());
    };
    if !path.exists() {
        return Ok(());
    }

    let raw = fs::read_to_string(&path)?;
    merge_toml(base, &raw)
        .map_err(|err| anyhow!("failed to parse signals config {}: {err}", path.display()))
}

pub fn load_config() -> Result<SignalsConfig> {
    let mut cfg = SignalsConfig::default();
    merge_file_config(&mut cfg)?;

    cfg.rate_limit.buffer_secs = env_or_u64(BUFFER_SECS_ENV, cfg.rate_limit.buffer_secs);
    cfg.rate_limit.bare_max_chars =
        env_or_usize(BARE_MAX_CHARS_ENV, cfg.rate_limit.bare_max_chars);
    cfg.audit.enabled = env_or_bool(AUDIT_ENABLED_ENV, cfg.audit.enabled);
    cfg.audit.log_path = env_or_optional_string(AUDIT_LOG_ENV, cfg.audit.log_path);

    validate(&cfg)?;
    Ok(cfg)
}
