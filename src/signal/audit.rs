use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::Path;

use crate::signal::util::now_epoch_secs;

#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    pub at_epoch_secs: u64,
    pub command: String,
    pub outcome: String,
    pub detail: String,
}

impl AuditEvent {
    pub fn new(command: &str, outcome: &str, detail: impl Into<String>) -> Result<Self> {
        Ok(Self {
            at_epoch_secs: now_epoch_secs()?,
            command: command.to_string(),
            outcome: outcome.to_string(),
            detail: detail.into(),
        })
    }
}

pub fn append_event(log_path: &Path, event: &AuditEvent) -> Result<()> {
    if let Some(parent) = log_path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    let line = format!("{}\n", serde_json::to_string(event)?);
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .with_context(|| format!("failed to open {}", log_path.display()))?;
    file.write_all(line.as_bytes())?;
    Ok(())
}
