//! Custom error types for promptweave.
//!
//! Generation itself never fails on bad data: missing or malformed category
//! files are logged and treated as empty. These errors surface from
//! configuration loading, store construction and the individual file parsers.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for promptweave operations
#[derive(Error, Debug)]
pub enum PromptError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Failed to load configuration
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        path: Option<PathBuf>,
    },

    /// Invalid configuration value
    #[error("Invalid configuration: {field} - {reason}")]
    InvalidConfig { field: String, reason: String },

    // =========================================================================
    // Data Errors
    // =========================================================================
    /// The configured data root does not exist
    #[error("Data root does not exist: {path}")]
    MissingDataRoot { path: PathBuf },

    /// A data file uses an extension with no available parser
    #[error("Unsupported data format '{extension}' for {path}")]
    UnsupportedFormat { path: PathBuf, extension: String },

    /// A data file parsed but has a shape that cannot become an option list
    #[error("Malformed data in {path}: {reason}")]
    MalformedData { path: PathBuf, reason: String },

    // =========================================================================
    // Wrapped Errors
    // =========================================================================
    /// IO error wrapper
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON error wrapper
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// TOML error wrapper
    #[error(transparent)]
    TomlDe(#[from] toml::de::Error),

    /// YAML error wrapper
    #[cfg(feature = "yaml")]
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    /// Generic error wrapper
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PromptError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            path: None,
        }
    }

    /// Create a configuration error with path
    pub fn config_with_path(message: impl Into<String>, path: PathBuf) -> Self {
        Self::Config {
            message: message.into(),
            path: Some(path),
        }
    }

    /// Create an invalid configuration error
    pub fn invalid_config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create a malformed data error
    pub fn malformed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::MalformedData {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Check if this error came from reading or parsing a data file.
    ///
    /// Data errors are downgraded to warnings by the loader.
    pub fn is_data_error(&self) -> bool {
        match self {
            Self::UnsupportedFormat { .. }
            | Self::MalformedData { .. }
            | Self::Io(_)
            | Self::Json(_)
            | Self::TomlDe(_) => true,
            #[cfg(feature = "yaml")]
            Self::Yaml(_) => true,
            _ => false,
        }
    }

    /// Get error code for exit status
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config { .. } | Self::InvalidConfig { .. } => 7,
            Self::MissingDataRoot { .. } => 6,
            _ => 1,
        }
    }
}

/// Type alias for promptweave results
pub type Result<T> = std::result::Result<T, PromptError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PromptError::invalid_config("random_empty_prob", "must be within [0, 1]");
        assert!(err.to_string().contains("random_empty_prob"));
        assert!(err.to_string().contains("[0, 1]"));
    }

    #[test]
    fn test_is_data_error() {
        assert!(PromptError::malformed("scene/a.json", "scalar root").is_data_error());
        assert!(PromptError::UnsupportedFormat {
            path: PathBuf::from("a.xml"),
            extension: "xml".into()
        }
        .is_data_error());
        assert!(!PromptError::config("bad").is_data_error());
        assert!(!PromptError::MissingDataRoot {
            path: PathBuf::from("/nope")
        }
        .is_data_error());
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(PromptError::config("test").exit_code(), 7);
        assert_eq!(PromptError::invalid_config("a", "b").exit_code(), 7);
        assert_eq!(
            PromptError::MissingDataRoot {
                path: PathBuf::from("/nope")
            }
            .exit_code(),
            6
        );
        assert_eq!(PromptError::malformed("x", "y").exit_code(), 1);
    }

    #[test]
    fn test_config_with_path() {
        let path = PathBuf::from("/test/promptweave.toml");
        let err = PromptError::config_with_path("failed to parse", path.clone());
        if let PromptError::Config {
            message,
            path: opt_path,
        } = err
        {
            assert_eq!(message, "failed to parse");
            assert_eq!(opt_path, Some(path));
        } else {
            panic!("Wrong error variant");
        }
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err: PromptError = io_err.into();
        assert!(matches!(err, PromptError::Io(_)));
        assert!(err.to_string().contains("access denied"));
    }

    #[test]
    fn test_error_from_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: PromptError = json_err.into();
        assert!(matches!(err, PromptError::Json(_)));
        assert!(err.is_data_error());
    }
}
