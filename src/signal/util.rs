use anyhow::Result;
use std::fs;
use std::io::Read;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::SignalError;

pub const STDIN_PATH: &str = "-";

/// Return the current Unix epoch in seconds.
pub fn now_epoch_secs() -> Result<u64> {
    Ok(SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs())
}

/// Read the whole input, `-` meaning standard input. Invalid UTF-8 is
/// replaced rather than rejected.
pub fn read_input(path: &Path) -> Result<String, SignalError> {
    let unreadable = |source| SignalError::InputUnreadable {
        path: path.to_path_buf(),
        source,
    };

    let bytes = if path.as_os_str() == STDIN_PATH {
        let mut buf = Vec::new();
        std::io::stdin().read_to_end(&mut buf).map_err(unreadable)?;
        buf
    } else {
        fs::read(path).map_err(unreadable)?
    };
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Truncate `input` to at most `max_chars` Unicode characters, stripping
/// control characters and appending `…` when truncated.
pub fn truncate_with_ellipsis(input: &str, max_chars: usize) -> String {
    let clean: String = input.chars().filter(|c| !c.is_control()).collect();
    if clean.chars().count() > max_chars {
        let mut s: String = clean.chars().take(max_chars).collect();
        s.push('…');
        s
    } else {
        clean
    }
}
