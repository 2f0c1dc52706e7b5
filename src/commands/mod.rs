pub mod extract;
pub mod learnings;
pub mod rate_limit;
pub mod status;

use serde::Serialize;

use crate::error::ExitStatus;

#[derive(Debug, Clone, Serialize)]
pub struct CommandReport {
    pub command: String,
    pub ok: bool,
    #[serde(skip)]
    pub status: ExitStatus,
    pub output: Vec<String>,
    pub details: Vec<String>,
    pub issues: Vec<String>,
}

impl CommandReport {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ok: true,
            status: ExitStatus::Success,
            output: Vec::new(),
            details: Vec::new(),
            issues: Vec::new(),
        }
    }

    pub fn output(&mut self, line: impl Into<String>) {
        self.output.push(line.into());
    }

    pub fn detail(&mut self, text: impl Into<String>) {
        self.details.push(text.into());
    }

    pub fn issue(&mut self, text: impl Into<String>) {
        self.ok = false;
        self.issues.push(text.into());
    }

    pub fn finish(&mut self, status: ExitStatus) {
        self.ok = status == ExitStatus::Success && self.issues.is_empty();
        self.status = status;
    }
}
