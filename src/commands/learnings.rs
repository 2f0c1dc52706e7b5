use anyhow::Result;
use std::path::PathBuf;

use crate::commands::CommandReport;
use crate::error::ExitStatus;
use crate::signal::learnings::extract_learnings;
use crate::signal::transcript::{TranscriptFormat, read_assistant_text};

#[derive(Debug, Clone)]
pub struct LearningsOptions {
    pub input: PathBuf,
    pub format: TranscriptFormat,
}

// Learnings are optional, so an absent block still succeeds.
pub fn run(opts: &LearningsOptions) -> Result<CommandReport> {
    let mut report = CommandReport::new("learnings");
    let text = read_assistant_text(&opts.input, opts.format)?;
    report.detail(format!("format={}", opts.format.as_str()));

    if let Some(learnings) = extract_learnings(&text) {
        report.detail(format!("learnings_lines={}", learnings.lines().count()));
        report.output(learnings);
    }
    report.finish(ExitStatus::Success);
    Ok(report)
}
