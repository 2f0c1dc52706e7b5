use clap::ValueEnum;
use serde_json::Value;
use std::path::Path;

use crate::error::SignalError;
use crate::signal::util::read_input;

/// Shape of the assistant output handed to an input command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum TranscriptFormat {
    /// Plain text, used as-is.
    #[default]
    Text,
    /// Claude CLI `--output-format stream-json` events, one per line.
    StreamJson,
    /// Codex CLI `--json` events, one per line.
    CodexJsonl,
}

impl TranscriptFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::StreamJson => "stream-json",
            Self::CodexJsonl => "codex-jsonl",
        }
    }
}

/// Recover the assistant's text from `raw` according to `format`.
pub fn assistant_text(raw: &str, format: TranscriptFormat) -> String {
    match format {
        TranscriptFormat::Text => raw.to_string(),
        TranscriptFormat::StreamJson => stream_json_text(raw),
        TranscriptFormat::CodexJsonl => codex_jsonl_text(raw),
    }
}

/// Read `path` (or stdin for `-`) and decode it as `format`.
pub fn read_assistant_text(path: &Path, format: TranscriptFormat) -> Result<String, SignalError> {
    let raw = read_input(path)?;
    Ok(assistant_text(&raw, format))
}

// Lines that are blank or not JSON are skipped.
fn json_events(raw: &str) -> impl Iterator<Item = Value> + '_ {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| serde_json::from_str::<Value>(line).ok())
}

/// Concatenate `text` blocks of `assistant` events and the `result` field of
/// `result` events. Tool calls contribute nothing.
pub fn stream_json_text(raw: &str) -> String {
    let mut out = String::new();

    for event in json_events(raw) {
        match event.get("type").and_then(Value::as_str) {
            Some("assistant") => {
                let Some(content) = event.pointer("/message/content").and_then(Value::as_array)
                else {
                    continue;
                };
                for part in content {
                    if part.get("type").and_then(Value::as_str) == Some("text")
                        && let Some(text) = part.get("text").and_then(Value::as_str)
                    {
                        out.push_str(text);
                    }
                }
            }
            Some("result") => {
                if let Some(text) = event.get("result").and_then(Value::as_str) {
                    out.push_str(text);
                }
            }
            _ => {}
        }
    }

    out
}

fn codex_item_text(item: &Value) -> Option<String> {
    match item.get("type").and_then(Value::as_str)? {
        "agent_message" | "assistant_message" => {
            item.get("text").and_then(Value::as_str).map(str::to_string)
        }
        "function_call" => {
            let name = item.get("name").and_then(Value::as_str)?;
            let arguments = item.get("arguments").and_then(Value::as_str)?;
            Some(format!("Called: {name}({arguments})"))
        }
        _ => None,
    }
}

/// One line per completed Codex item: message text, or `Called: name(args)`
/// for function calls.
pub fn codex_jsonl_text(raw: &str) -> String {
    json_events(raw)
        .filter(|event| event.get("type").and_then(Value::as_str) == Some("item.completed"))
        .filter_map(|event| event.get("item").and_then(codex_item_text))
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
