//! Error handling for project-util
//!
//! Every public operation returns [`Result`]. Nothing is retried internally;
//! the first failure is handed straight back to the caller.

use thiserror::Error;

/// Result type alias for project-util operations
pub type Result<T> = std::result::Result<T, ProjectError>;

/// Main error type for project-util operations
#[derive(Error, Debug)]
pub enum ProjectError {
    // Argument Errors
    #[error("Invalid argument: {reason}")]
    InvalidArgument { reason: String },

    #[error("Name already in use: {name}")]
    NameConflict { name: String },

    #[error("Not found: {name}")]
    NotFound { name: String },

    // Storage Errors
    #[error("Storage error at {location}: {reason}")]
    Storage {
        location: String,
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Operation '{operation}' is not supported by the {backend} backend")]
    UnsupportedOperation {
        operation: &'static str,
        backend: String,
    },

    // Media Errors
    #[error("No frames found in {location}")]
    EmptyFrameSet { location: String },

    #[error("Image codec error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Super-resolution failed: {reason}")]
    Inference { reason: String },

    #[error("Video encoding failed: {reason}")]
    VideoEncoding { reason: String },

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ProjectError {
    /// Build a storage error from any underlying failure
    pub fn storage<E>(location: impl Into<String>, reason: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        ProjectError::Storage {
            location: location.into(),
            reason: reason.into(),
            source: Some(Box::new(source)),
        }
    }

    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        ProjectError::InvalidArgument {
            reason: reason.into(),
        }
    }

    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            ProjectError::InvalidArgument { .. } => "INVALID_ARGUMENT",
            ProjectError::NameConflict { .. } => "NAME_CONFLICT",
            ProjectError::NotFound { .. } => "NOT_FOUND",
            ProjectError::Storage { .. } => "STORAGE_ERROR",
            ProjectError::UnsupportedOperation { .. } => "UNSUPPORTED_OPERATION",
            ProjectError::EmptyFrameSet { .. } => "EMPTY_FRAME_SET",
            ProjectError::Image(_) => "IMAGE_CODEC_ERROR",
            ProjectError::Inference { .. } => "INFERENCE_ERROR",
            ProjectError::VideoEncoding { .. } => "VIDEO_ENCODING_ERROR",
            ProjectError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Check if the caller can reasonably fix the input and try again
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ProjectError::InvalidArgument { .. }
                | ProjectError::NameConflict { .. }
                | ProjectError::NotFound { .. }
                | ProjectError::EmptyFrameSet { .. }
        )
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            ProjectError::NameConflict { .. } => vec![
                "Pick a different folder name",
                "Look the existing folder up with child() instead of adding it again",
            ],
            ProjectError::Storage { .. } => vec![
                "Check permissions on the target directory or bucket",
                "Verify the storage credentials in the environment",
                "Remove files from a folder before removing the folder itself",
            ],
            ProjectError::UnsupportedOperation { .. } => vec![
                "Use a local project for directory management and video export",
            ],
            ProjectError::EmptyFrameSet { .. } => vec![
                "Save at least one image into the folder before exporting",
            ],
            ProjectError::Inference { .. } => vec![
                "Check that the super-resolution bridge is running",
                "Verify the model files exist in the model directory",
            ],
            ProjectError::VideoEncoding { .. } => vec![
                "Check that ffmpeg is installed and on PATH",
                "Try a different codec",
            ],
            _ => vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = ProjectError::NameConflict {
            name: "sketches".to_string(),
        };
        assert_eq!(err.error_code(), "NAME_CONFLICT");
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_storage_error_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = ProjectError::storage("/tmp/x", "write failed", io);

        assert_eq!(err.error_code(), "STORAGE_ERROR");
        assert!(!err.is_recoverable());
        assert!(std::error::Error::source(&err).is_some());
        assert!(!err.recovery_suggestions().is_empty());
    }

    #[test]
    fn test_unsupported_message_names_backend() {
        let err = ProjectError::UnsupportedOperation {
            operation: "remove",
            backend: "remote".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Operation 'remove' is not supported by the remote backend"
        );
    }
}
