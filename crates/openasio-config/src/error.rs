//! Error types for profile operations.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading, saving or validating profiles.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    ReadFile {
        /// Path of the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a file
    #[error("failed to write file '{path}': {source}")]
    WriteFile {
        /// Path of the file that could not be written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to create directory
    #[error("failed to create directory '{path}': {source}")]
    CreateDir {
        /// Path of the directory that could not be created.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Failed to serialize TOML
    #[error("failed to serialize TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// Profile not found by name or path
    #[error("profile not found: {0}")]
    ProfileNotFound(String),

    /// Profile names are used as file stems
    #[error("invalid profile name '{0}'")]
    InvalidName(String),

    /// The stream section is not a usable configuration
    #[error("invalid stream configuration: {0}")]
    InvalidStream(#[from] openasio_core::Error),
}

impl ConfigError {
    /// Create a read file error.
    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::ReadFile {
            path: path.into(),
            source,
        }
    }

    /// Create a write file error.
    pub fn write_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::WriteFile {
            path: path.into(),
            source,
        }
    }

    /// Create a create directory error.
    pub fn create_dir(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::CreateDir {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    fn mock_io_err() -> std::io::Error {
        std::io::Error::new(std::io::ErrorKind::PermissionDenied, "mock")
    }

    #[test]
    fn io_variants_keep_path_and_source() {
        let err = ConfigError::read_file("/a/b.toml", mock_io_err());
        assert!(err.to_string().contains("/a/b.toml"));
        assert!(err.source().is_some());

        let err = ConfigError::write_file("/a/c.toml", mock_io_err());
        assert!(err.to_string().starts_with("failed to write file"));

        let err = ConfigError::create_dir("/a", mock_io_err());
        assert!(
            matches!(err, ConfigError::CreateDir { ref path, .. } if path == std::path::Path::new("/a"))
        );
    }

    #[test]
    fn stream_errors_convert() {
        let err: ConfigError = openasio_core::Error::invalid_arg("sample rate is zero").into();
        assert_eq!(
            err.to_string(),
            format!(
                "invalid stream configuration: {}",
                openasio_core::Error::invalid_arg("sample rate is zero")
            )
        );
    }

    #[test]
    fn not_found_display() {
        let err = ConfigError::ProfileNotFound("studio".to_string());
        assert_eq!(err.to_string(), "profile not found: studio");
        assert!(err.source().is_none());
    }
}
