use anyhow::Result;
use std::path::PathBuf;

use crate::commands::CommandReport;
use crate::error::ExitStatus;
use crate::signal::config::RateLimitSettings;
use crate::signal::rate_limit::{RateLimitResolver, RateLimitSignal, Unparseable};
use crate::signal::transcript::{TranscriptFormat, read_assistant_text};
use crate::signal::warn;

#[derive(Debug, Clone)]
pub struct RateLimitOptions {
    pub input: PathBuf,
    pub format: TranscriptFormat,
}

fn unparseable_code(reason: &Unparseable) -> &'static str {
    match reason {
        Unparseable::NoResetTime => "NO_RESET_TIME",
        Unparseable::UnknownZone(_) => "UNKNOWN_ZONE",
        Unparseable::BadTime { .. } => "BAD_TIME",
        Unparseable::NoInstant { .. } => "NO_INSTANT",
    }
}

pub fn run(opts: &RateLimitOptions, settings: &RateLimitSettings) -> Result<CommandReport> {
    let mut report = CommandReport::new("rate-limit");
    let text = read_assistant_text(&opts.input, opts.format)?;
    report.detail(format!("format={}", opts.format.as_str()));
    let resolver = RateLimitResolver::new(settings.buffer_secs, settings.bare_max_chars);

    match resolver.resolve(&text) {
        RateLimitSignal::NotDetected => report.finish(ExitStatus::NotFound),
        RateLimitSignal::DetectedUnparseable(reason) => {
            report.issue(warn::format_line(
                unparseable_code(&reason),
                "rate_limit",
                &opts.input.display().to_string(),
                &reason.to_string(),
                "",
            ));
            report.finish(ExitStatus::Unparseable);
        }
        RateLimitSignal::DetectedResolved(reset) => {
            report.output(reset.epoch_secs.to_string());
            report.output(reset.human_readable.clone());
            report.output(reset.time_zone_id.clone());
            report.detail(format!("reset_epoch={}", reset.epoch_secs));
            report.finish(ExitStatus::Success);
        }
    }

    Ok(report)
}
