//! # Design
//!
//! - Centralize application-level errors for the boot sequence.
//! - Keep error messages constant while carrying context fields for debugging.
//! - Preserve source errors without re-logging at call sites.

use std::error::Error as StdError;

use thiserror::Error;

/// Result alias for application operations.
pub type AppResult<T> = Result<T, AppError>;

/// Boxed error carried by variants whose source is not a concrete type.
pub type BoxedSource = Box<dyn StdError + Send + Sync + 'static>;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration operations failed.
    #[error("configuration operation failed")]
    Config {
        /// Operation identifier.
        operation: &'static str,
        /// Source configuration error.
        source: restkit_config::ConfigError,
    },
    /// Telemetry operations failed.
    #[error("telemetry operation failed")]
    Telemetry {
        /// Operation identifier.
        operation: &'static str,
        /// Source telemetry error.
        source: restkit_telemetry::TelemetryError,
    },
    /// The exception taxonomy could not be declared.
    #[error("exception registry operation failed")]
    Registry {
        /// Operation identifier.
        operation: &'static str,
        /// Source registry error.
        source: restkit_errors::RegistryError,
    },
    /// API server operations failed.
    #[error("api server operation failed")]
    ApiServer {
        /// Operation identifier.
        operation: &'static str,
        /// Source API server error.
        source: BoxedSource,
    },
}

impl AppError {
    pub(crate) const fn config(
        operation: &'static str,
        source: restkit_config::ConfigError,
    ) -> Self {
        Self::Config { operation, source }
    }

    pub(crate) const fn telemetry(
        operation: &'static str,
        source: restkit_telemetry::TelemetryError,
    ) -> Self {
        Self::Telemetry { operation, source }
    }

    pub(crate) const fn registry(
        operation: &'static str,
        source: restkit_errors::RegistryError,
    ) -> Self {
        Self::Registry { operation, source }
    }

    pub(crate) fn api_server(operation: &'static str, source: impl Into<BoxedSource>) -> Self {
        Self::ApiServer {
            operation,
            source: source.into(),
        }
    }

    /// Identifier of the step that failed.
    #[must_use]
    pub const fn operation(&self) -> &'static str {
        match self {
            Self::Config { operation, .. }
            | Self::Telemetry { operation, .. }
            | Self::Registry { operation, .. }
            | Self::ApiServer { operation, .. } => operation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn app_error_helpers_build_variants() {
        let config = AppError::config(
            "settings.load",
            restkit_config::ConfigError::InvalidEnvironment {
                value: "staging".to_string(),
            },
        );
        assert!(matches!(config, AppError::Config { .. }));
        assert_eq!(config.to_string(), "configuration operation failed");

        let telemetry = AppError::telemetry(
            "telemetry.init",
            restkit_telemetry::TelemetryError::InvalidLogFormat {
                value: "xml".to_string(),
            },
        );
        assert!(matches!(telemetry, AppError::Telemetry { .. }));

        let registry = AppError::registry(
            "registry.standard",
            restkit_errors::RegistryError::DuplicateKind { name: "not_found" },
        );
        assert!(matches!(registry, AppError::Registry { .. }));
        assert_eq!(registry.operation(), "registry.standard");

        let api = AppError::api_server("api_server.serve", io::Error::other("address in use"));
        assert!(matches!(api, AppError::ApiServer { .. }));
        assert_eq!(api.operation(), "api_server.serve");
    }

    #[test]
    fn sources_are_preserved() {
        let api = AppError::api_server("api_server.serve", io::Error::other("address in use"));
        assert_eq!(
            api.source().map(ToString::to_string).as_deref(),
            Some("address in use")
        );
    }
}
