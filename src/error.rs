use std::path::PathBuf;
use thiserror::Error;

/// Why a directory child was rejected during collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidReason {
    /// Not a regular file (socket, fifo, device, dangling symlink)
    NotAFile,
    /// Zero-length file, nothing to store
    EmptyFile,
    /// Relative path cannot be represented in the configured name encoding
    UnencodableName,
}

impl std::fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvalidReason::NotAFile => write!(f, "Not a file"),
            InvalidReason::EmptyFile => write!(f, "Useless empty file"),
            InvalidReason::UnencodableName => write!(f, "Name not encodable"),
        }
    }
}

#[derive(Error, Debug)]
pub enum XrofsError {
    #[error("Not a directory ({0})")]
    NotADirectory(PathBuf),

    #[error("File access error ({path}): {source}")]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Useless empty directory ({0})")]
    EmptyDirectory(PathBuf),

    #[error("{reason} ({path})")]
    InvalidEntry { path: PathBuf, reason: InvalidReason },

    #[error("I/O size mismatch. Expected {expected}, got {actual} ({path})")]
    SizeMismatch {
        path: PathBuf,
        expected: u64,
        actual: u64,
    },

    #[error("Value {value} does not fit {field} field (max {max})")]
    EncodingOverflow {
        field: &'static str,
        value: u64,
        max: u64,
    },

    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("File not found in image: {0}")]
    FileNotFound(String),

    #[error("Destination already exists: {0}")]
    DestinationExists(PathBuf),

    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Invalid option: {0}")]
    InvalidOption(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl XrofsError {
    /// Whether force mode is allowed to skip this error and continue the build
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            XrofsError::FileAccess { .. }
                | XrofsError::EmptyDirectory(_)
                | XrofsError::InvalidEntry { .. }
                | XrofsError::SizeMismatch { .. }
        )
    }

    /// Short kind name used as the prefix of diagnostic lines
    pub fn kind(&self) -> &'static str {
        match self {
            XrofsError::NotADirectory(_) => "NotADirectoryError",
            XrofsError::FileAccess { .. } => "FileAccessError",
            XrofsError::EmptyDirectory(_) => "EmptyDirectoryError",
            XrofsError::InvalidEntry { .. } => "InvalidEntryError",
            XrofsError::SizeMismatch { .. } => "SizeMismatchError",
            XrofsError::EncodingOverflow { .. } => "EncodingOverflowError",
            XrofsError::InvalidImage(_) => "InvalidImageError",
            XrofsError::FileNotFound(_) => "FileNotFoundError",
            XrofsError::DestinationExists(_) => "DestinationExistsError",
            XrofsError::Config(_) => "ConfigError",
            XrofsError::InvalidOption(_) => "InvalidOptionError",
            XrofsError::Io(_) => "IoError",
        }
    }

    /// `Kind: message`, the form printed by the command line tools
    pub fn pretty(&self) -> String {
        format!("{}: {}", self.kind(), self)
    }
}

pub type Result<T> = std::result::Result<T, XrofsError>;
