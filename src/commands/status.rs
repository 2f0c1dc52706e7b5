use anyhow::Result;
use std::env;

use crate::commands::CommandReport;
use crate::error::ExitStatus;
use crate::signal::config::{ENV_OVERRIDE_KEYS, load_config, resolve_config_path};

fn env_overrides() -> Vec<String> {
    ENV_OVERRIDE_KEYS
        .iter()
        .filter(|key| env::var_os(key).is_some())
        .map(|key| (*key).to_string())
        .collect()
}

pub fn run() -> Result<CommandReport> {
    let mut report = CommandReport::new("status");
    report.detail(format!("version={}", env!("CARGO_PKG_VERSION")));

    match resolve_config_path() {
        Some(path) if path.exists() => report.detail(format!("config_path={}", path.display())),
        Some(path) => report.detail(format!("config_path={} (absent, defaults)", path.display())),
        None => report.detail("config_path=none (HOME unresolved, defaults)"),
    }

    let overrides = env_overrides();
    if !overrides.is_empty() {
        report.detail(format!("env_overrides={}", overrides.join(",")));
    }

    let cfg = match load_config() {
        Ok(cfg) => cfg,
        Err(err) => {
            report.issue(format!("{err:#}"));
            report.finish(ExitStatus::NotFound);
            return Ok(report);
        }
    };

    report.detail(format!(
        "rate_limit.buffer_secs={}",
        cfg.rate_limit.buffer_secs
    ));
    report.detail(format!(
        "rate_limit.bare_max_chars={}",
        cfg.rate_limit.bare_max_chars
    ));
    report.detail(format!("audit.enabled={}", cfg.audit.enabled));
    if let Some(log_path) = cfg.audit.log_path.as_deref() {
        report.detail(format!("audit.log_path={log_path}"));
    }

    report.finish(ExitStatus::Success);
    Ok(report)
}
