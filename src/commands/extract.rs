use anyhow::Result;
use std::path::PathBuf;

use crate::commands::CommandReport;
use crate::error::ExitStatus;
use crate::signal::locator::{LocateMiss, locate_detailed};
use crate::signal::transcript::{TranscriptFormat, read_assistant_text};
use crate::signal::util::truncate_with_ellipsis;
use crate::signal::warn;

const MAX_REASON_CHARS: usize = 160;

#[derive(Debug, Clone)]
pub struct ExtractOptions {
    pub input: PathBuf,
    pub format: TranscriptFormat,
    pub marker_key: String,
}

fn miss_code(miss: &LocateMiss) -> &'static str {
    match miss {
        LocateMiss::MarkerAbsent(_) => "MARKER_ABSENT",
        LocateMiss::NoOpeningBrace(_) => "NO_OPENING_BRACE",
        LocateMiss::Unterminated(_) => "UNTERMINATED",
        LocateMiss::InvalidJson { .. } => "INVALID_JSON",
        LocateMiss::MarkerNotTopLevel(_) => "NOT_TOP_LEVEL",
    }
}

pub fn run(opts: &ExtractOptions) -> Result<CommandReport> {
    let mut report = CommandReport::new("extract");
    let text = read_assistant_text(&opts.input, opts.format)?;
    report.detail(format!("format={}", opts.format.as_str()));

    match locate_detailed(&text, &opts.marker_key) {
        Ok(found) => {
            report.output(found.to_json_line()?);
            report.detail(format!("marker_key={}", opts.marker_key));
            report.finish(ExitStatus::Success);
        }
        Err(miss) => {
            report.issue(warn::format_line(
                miss_code(&miss),
                "locate",
                &opts.input.display().to_string(),
                &truncate_with_ellipsis(&miss.to_string(), MAX_REASON_CHARS),
                "",
            ));
            report.finish(ExitStatus::NotFound);
        }
    }

    Ok(report)
}
