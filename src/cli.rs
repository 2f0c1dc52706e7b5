use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::commands::extract::ExtractOptions;
use crate::commands::learnings::LearningsOptions;
use crate::commands::rate_limit::RateLimitOptions;
use crate::commands::{self, CommandReport};
use crate::error::ExitStatus;
use crate::signal::audit::{AuditEvent, append_event};
use crate::signal::config::{AuditSettings, SignalsConfig, load_config, resolve_config_path};
use crate::signal::transcript::TranscriptFormat;
use crate::signal::warn;

#[derive(Debug, Parser)]
#[command(
    name = "ralph-signals",
    version,
    about = "Recover status JSON, learnings and rate-limit resets from assistant output"
)]
struct Cli {
    /// Print the command report as JSON instead of plain lines.
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct InputArgs {
    /// Input file, or `-` for stdin.
    file: PathBuf,
    /// How the assistant output was captured.
    #[arg(long, value_enum, default_value_t = TranscriptFormat::Text)]
    format: TranscriptFormat,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the first JSON object carrying MARKER_KEY as a top-level key.
    Extract {
        #[command(flatten)]
        input: InputArgs,
        marker_key: String,
    },
    /// Detect a rate-limit notice and print epoch, local time and zone of the reset.
    RateLimit {
        #[command(flatten)]
        input: InputArgs,
    },
    /// Print the RALPH_LEARNINGS block, if any.
    Learnings {
        #[command(flatten)]
        input: InputArgs,
    },
    /// Show the effective configuration.
    Status,
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Self::Extract { .. } => "extract",
            Self::RateLimit { .. } => "rate-limit",
            Self::Learnings { .. } => "learnings",
            Self::Status => "status",
        }
    }
}

fn record(audit: &AuditSettings, command: &str, outcome: &str, detail: &str) {
    if !audit.enabled {
        return;
    }
    let Some(log_path) = audit.log_path.as_deref() else {
        return;
    };
    let appended = AuditEvent::new(command, outcome, detail)
        .and_then(|event| append_event(Path::new(log_path), &event));
    if let Err(err) = appended {
        warn::emit(
            "AUDIT_WRITE_FAILED",
            "audit",
            log_path,
            "could not append audit event",
            &format!("{err:#}"),
        );
    }
}

fn print_report(report: &CommandReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }
    for line in &report.output {
        println!("{line}");
    }
    for issue in &report.issues {
        eprintln!("{issue}");
    }
    Ok(())
}

fn print_status_report(report: &CommandReport, json: bool) -> Result<()> {
    if json {
        return print_report(report, true);
    }
    println!("{} ok={}", report.command, report.ok);
    for detail in &report.details {
        println!("  {detail}");
    }
    for issue in &report.issues {
        eprintln!("  issue: {issue}");
    }
    Ok(())
}

// Input commands keep their exit-code meaning under a broken config; status
// reports the failure itself.
fn effective_config(command: &Command) -> SignalsConfig {
    match load_config() {
        Ok(cfg) => cfg,
        Err(err) => {
            if !matches!(command, Command::Status) {
                let config_path = resolve_config_path()
                    .map(|path| path.display().to_string())
                    .unwrap_or_default();
                warn::emit(
                    "CONFIG_INVALID",
                    "config",
                    &config_path,
                    "using default settings",
                    &format!("{err:#}"),
                );
            }
            SignalsConfig::default()
        }
    }
}

pub fn run() -> Result<ExitStatus> {
    let cli = Cli::parse();
    let name = cli.command.name();
    let cfg = effective_config(&cli.command);

    let outcome = match cli.command {
        Command::Extract { input, marker_key } => commands::extract::run(&ExtractOptions {
            input: input.file,
            format: input.format,
            marker_key,
        }),
        Command::RateLimit { input } => commands::rate_limit::run(
            &RateLimitOptions {
                input: input.file,
                format: input.format,
            },
            &cfg.rate_limit,
        ),
        Command::Learnings { input } => commands::learnings::run(&LearningsOptions {
            input: input.file,
            format: input.format,
        }),
        Command::Status => commands::status::run(),
    };

    let report = match outcome {
        Ok(report) => report,
        Err(err) => {
            record(&cfg.audit, name, "error", &format!("{err:#}"));
            return Err(err);
        }
    };

    record(
        &cfg.audit,
        name,
        report.status.as_str(),
        &report.details.join(" "),
    );
    if name == "status" {
        print_status_report(&report, cli.json)?;
    } else {
        print_report(&report, cli.json)?;
    }
    Ok(report.status)
}
