use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SignalError {
    #[error("failed to read {}: {source}", path.display())]
    InputUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("config invalid: {0}")]
    InvalidConfig(String),
}

/// Process exit codes shared by every subcommand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    NotFound,
    Unparseable,
}

impl ExitStatus {
    pub fn code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::NotFound => 1,
            Self::Unparseable => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::NotFound => "not_found",
            Self::Unparseable => "unparseable",
        }
    }
}
