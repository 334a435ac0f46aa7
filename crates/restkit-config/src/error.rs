//! Error types for settings resolution.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Primary error type for configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The environment name was not recognised.
    #[error("invalid environment")]
    InvalidEnvironment {
        /// Environment payload provided by the caller.
        value: String,
    },
    /// Bind address value was invalid.
    #[error("invalid bind address")]
    InvalidBindAddr {
        /// Bind address payload provided by the caller.
        value: String,
    },
    /// Field contained an invalid value.
    #[error("invalid configuration field")]
    InvalidField {
        /// Field that failed validation.
        field: &'static str,
        /// Offending value.
        value: String,
        /// Machine-readable reason for the failure.
        reason: &'static str,
    },
    /// Media credentials were only partially configured.
    #[error("incomplete media storage credentials")]
    IncompleteMedia {
        /// First missing credential.
        missing: &'static str,
    },
    /// The settings file could not be read.
    #[error("failed to read settings file")]
    ReadFile {
        /// Path that failed to load.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// The settings file was not valid YAML for the settings schema.
    #[error("failed to parse settings file")]
    ParseFile {
        /// Path that failed to parse.
        path: PathBuf,
        /// Underlying YAML error.
        source: serde_yaml::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn config_error_messages_are_constant() {
        let cases = [
            (
                ConfigError::InvalidEnvironment {
                    value: "staging".into(),
                },
                "invalid environment",
            ),
            (
                ConfigError::InvalidBindAddr {
                    value: "nope".into(),
                },
                "invalid bind address",
            ),
            (
                ConfigError::InvalidField {
                    field: "max_body_bytes",
                    value: "0".into(),
                    reason: "must_be_positive",
                },
                "invalid configuration field",
            ),
            (
                ConfigError::IncompleteMedia {
                    missing: "api_secret",
                },
                "incomplete media storage credentials",
            ),
        ];
        for (error, message) in cases {
            assert_eq!(error.to_string(), message);
        }
    }

    #[test]
    fn file_errors_expose_their_source() {
        let error = ConfigError::ReadFile {
            path: PathBuf::from("settings.yaml"),
            source: io::Error::other("missing"),
        };
        assert_eq!(error.to_string(), "failed to read settings file");
        assert!(error.source().is_some());
    }
}
