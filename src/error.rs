// error.rs
// Error taxonomy for a run and its mapping onto process exit codes

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can abort a run.
///
/// Publish failures never appear here; they are reported through
/// [`crate::pipeline::publish::PublishOutcome`] and never abort anything.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to run {tool}: {reason}")]
    ProcessInvocation { tool: String, reason: String },

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid offset table: {0}")]
    InvalidTable(String),

    #[error("identifiers {first:?} and {second:?} both sanitize to `{sanitized}`{}", scope_suffix(.namespace))]
    IdentifierCollision {
        namespace: Option<String>,
        first: String,
        second: String,
        sanitized: String,
    },

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    ConfigFile(#[from] toml::de::Error),
}

fn scope_suffix(namespace: &Option<String>) -> String {
    match namespace {
        Some(ns) => format!(" in namespace {:?}", ns),
        None => String::new(),
    }
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    pub fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Error::Json {
            path: path.into(),
            source,
        }
    }

    /// Process exit status for this failure. 0 is reserved for success.
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::ProcessInvocation { .. } => 2,
            Error::Io { .. } => 3,
            Error::Json { .. } | Error::InvalidTable(_) => 4,
            Error::IdentifierCollision { .. } => 5,
            Error::Config(_) | Error::ConfigFile(_) => 6,
        }
    }
}
