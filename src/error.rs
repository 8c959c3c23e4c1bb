// Error taxonomy for the library. Each concern gets its own enum so callers
// can match on the kind; the binary wraps them in `anyhow` for reporting.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failures of a completion request.
#[derive(Debug, Error)]
pub enum CompletionError {
    /// HTTP 429.
    #[error("rate limit exceeded")]
    RateLimited,
    /// HTTP 401.
    #[error("invalid API key")]
    Unauthorized,
    /// Any other non-success status, with its reason phrase.
    #[error("HTTP Error {status}: {reason}")]
    Http { status: u16, reason: String },
    #[error("unknown model `{0}`")]
    UnknownModel(String),
    /// Connection, TLS or timeout failures.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("malformed completion response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Failures reading or writing transcripts on disk.
#[derive(Debug, Error)]
pub enum TranscriptError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The file exists but is not a JSON message array.
    #[error("transcript at {} is corrupt: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// The file decodes but breaks the transcript shape.
    #[error("transcript at {} is invalid: {reason}", .path.display())]
    Invalid { path: PathBuf, reason: String },
    #[error("failed to encode transcript: {0}")]
    Encode(#[source] serde_json::Error),
}

impl TranscriptError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        TranscriptError::Io {
            path: path.into(),
            source,
        }
    }

    /// True for the decode failures the orchestrator may recover from.
    pub fn is_unreadable(&self) -> bool {
        matches!(
            self,
            TranscriptError::Corrupt { .. } | TranscriptError::Invalid { .. }
        )
    }
}

/// Failures loading the config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(
        "Configuration file not found at {}.\nCreate it with apiKey, defaultModel, temperature, topP, maxTokens and logDirectory.",
        .path.display()
    )]
    NotFound { path: PathBuf },
    #[error("could not read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("could not parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("could not determine the home directory")]
    NoHome,
}
