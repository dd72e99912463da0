//! Error types and result handling for ransom-sentry.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our custom Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while loading signatures or scanning input.
///
/// Any read failure during a scan is an error. A scan never degrades to a
/// clean verdict because the input could not be read in full.
#[derive(Error, Debug)]
pub enum Error {
    // ===== Input =====
    #[error("input stream failed mid-read: {source}")]
    StreamRead {
        #[source]
        source: std::io::Error,
    },

    #[error("cannot read {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    // ===== Signatures =====
    #[error("unsupported hash algorithm '{0}'")]
    UnsupportedAlgorithm(String),

    #[error("invalid signature '{entry}': {reason}")]
    InvalidSignature { entry: String, reason: String },

    #[error("cannot load signature feed: {0}")]
    SignatureLoad(String),

    // ===== Configuration =====
    #[error("cannot load configuration: {0}")]
    ConfigLoad(String),

    #[error("cannot save configuration: {0}")]
    ConfigSave(String),

    #[error("invalid configuration value {field}: {message}")]
    ConfigInvalid { field: String, message: String },

    // ===== Scanning =====
    #[error("scan cancelled")]
    ScanCancelled,

    #[error("lock poisoned: {context}")]
    LockPoisoned { context: String },

    // ===== Output =====
    #[error("JSON encoding failed: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl Error {
    pub fn file_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileRead {
            path: path.into(),
            source,
        }
    }

    pub fn stream_read(source: std::io::Error) -> Self {
        Self::StreamRead { source }
    }

    pub fn invalid_signature(entry: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidSignature {
            entry: entry.into(),
            reason: reason.into(),
        }
    }

    pub fn lock_poisoned(context: impl Into<String>) -> Self {
        Self::LockPoisoned {
            context: context.into(),
        }
    }

    /// True when the input could not be read to completion, so its
    /// status is unknown.
    pub fn is_io(&self) -> bool {
        self.category() == ErrorCategory::Io
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::ScanCancelled)
    }

    /// A hint for the user, printed under the error by the CLI.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Error::PathNotFound(_) => Some("Check that the path exists and is accessible"),
            Error::FileRead { .. } | Error::StreamRead { .. } => {
                Some("The input was not fully read; treat it as unscanned, not clean")
            }
            Error::UnsupportedAlgorithm(_) => Some("Supported algorithms: md5, sha1, sha256, sha512"),
            Error::InvalidSignature { .. } => {
                Some("Fix or remove the offending entry; `signatures check <FILE>` validates a feed")
            }
            Error::SignatureLoad(_) => Some("JSON feeds need a \"signatures\" array of {\"hash\": ...} entries"),
            Error::ConfigLoad(_) | Error::ConfigInvalid { .. } => {
                Some("Run `config show` to see the effective settings, or `config reset --yes`")
            }
            Error::LockPoisoned { .. } => Some("A worker panicked; restart the scan"),
            _ => None,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::StreamRead { .. }
            | Error::FileRead { .. }
            | Error::PathNotFound(_)
            | Error::Io(_) => ErrorCategory::Io,

            Error::UnsupportedAlgorithm(_)
            | Error::InvalidSignature { .. }
            | Error::SignatureLoad(_) => ErrorCategory::Signatures,

            Error::ConfigLoad(_) | Error::ConfigSave(_) | Error::ConfigInvalid { .. } => {
                ErrorCategory::Configuration
            }

            Error::ScanCancelled | Error::LockPoisoned { .. } => ErrorCategory::Scanning,

            Error::JsonSerialize(_) => ErrorCategory::Output,
        }
    }
}

/// Broad error class, used in log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Io,
    Signatures,
    Configuration,
    Scanning,
    Output,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Io => "io",
            Self::Signatures => "signatures",
            Self::Configuration => "config",
            Self::Scanning => "scan",
            Self::Output => "output",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
