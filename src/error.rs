//! Error types for docshelf
//!
//! Defines the crate-wide error enum covering all failure modes.
//! Uses thiserror for ergonomic error handling.

use thiserror::Error;

/// Result type alias for docshelf operations
pub type Result<T> = std::result::Result<T, DocshelfError>;

/// Crate-wide error type for docshelf operations
#[derive(Error, Debug)]
pub enum DocshelfError {
    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// Document directory absent
    #[error("cannot find document {0}")]
    DocumentNotFound(String),

    /// Version directory absent
    #[error("version {version} of document {document} not found")]
    VersionNotFound { document: String, version: String },

    /// File absent within an existing version
    #[error("file {filename} not found in version {version} of document {document}")]
    FileNotFound {
        document: String,
        version: String,
        filename: String,
    },

    /// Malformed command arguments
    #[error("invalid command: {0}")]
    InvalidCommand(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Bus wire message errors
    #[error("wire error: {0}")]
    Wire(#[from] crate::bus::wire::WireError),

    /// MIME parsing errors
    #[error("mail error: {0}")]
    Mime(#[from] crate::ingest::mime::MimeError),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl DocshelfError {
    /// Whether this error is a missing document, version, or file.
    ///
    /// Not-found errors are recovered by the command handlers and rendered
    /// as user notices; everything else propagates.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            DocshelfError::DocumentNotFound(_)
                | DocshelfError::VersionNotFound { .. }
                | DocshelfError::FileNotFound { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_classification() {
        assert!(DocshelfError::DocumentNotFound("spec".to_string()).is_not_found());
        assert!(DocshelfError::VersionNotFound {
            document: "spec".to_string(),
            version: "1.0".to_string(),
        }
        .is_not_found());
        assert!(!DocshelfError::Config("bad".to_string()).is_not_found());
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: DocshelfError = io.into();
        assert!(!err.is_not_found());
        assert!(err.to_string().contains("denied"));
    }
}
