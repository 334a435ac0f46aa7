//! Typed settings models.
//!
//! # Design
//! - Each environment carries its own defaults; files and env vars only
//!   override what they name.
//! - Media credentials are all-or-nothing so a half-configured uploader never
//!   reaches runtime.

use std::fmt::{self, Display, Formatter};
use std::net::{Ipv4Addr, SocketAddr};
use std::str::FromStr;

use restkit_telemetry::LogFormat;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default cap on request body size.
pub const DEFAULT_MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

const DEFAULT_PORT: u16 = 8000;

/// Deployment environment selecting the default settings profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppEnvironment {
    /// Developer machine: loopback bind, verbose human-readable logs.
    #[default]
    Local,
    /// Production: all interfaces, JSON logs at info.
    Live,
}

impl AppEnvironment {
    /// Lowercase environment name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Live => "live",
        }
    }
}

impl Display for AppEnvironment {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for AppEnvironment {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "live" => Ok(Self::Live),
            _ => Err(ConfigError::InvalidEnvironment {
                value: value.to_string(),
            }),
        }
    }
}

/// Credentials for the hosted media store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaSettings {
    /// Account (cloud) name.
    pub cloud_name: String,
    /// Public API key.
    pub api_key: String,
    /// API secret used to sign uploads.
    pub api_secret: String,
    /// Base URL of the upload API.
    pub api_base_url: String,
    /// Largest remote picture fetched for an upload.
    #[serde(default = "MediaSettings::default_max_download_bytes")]
    pub max_download_bytes: usize,
}

impl MediaSettings {
    /// Default upload API endpoint.
    pub const DEFAULT_API_BASE_URL: &'static str = "https://api.cloudinary.com/v1_1";
    /// Default cap on pictures fetched from a URL.
    pub const DEFAULT_MAX_DOWNLOAD_BYTES: usize = 10 * 1024 * 1024;

    const fn default_max_download_bytes() -> usize {
        Self::DEFAULT_MAX_DOWNLOAD_BYTES
    }
}

/// Fully resolved service settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Active environment.
    pub environment: AppEnvironment,
    /// Socket address the HTTP server binds to.
    pub bind_addr: SocketAddr,
    /// Log filter directive.
    pub log_level: String,
    /// Log output format.
    pub log_format: LogFormat,
    /// Largest accepted request body.
    pub max_body_bytes: usize,
    /// Header carrying the authenticated caller's name, if identity is forwarded.
    pub identity_header: Option<String>,
    /// Media store credentials; `None` disables uploads.
    pub media: Option<MediaSettings>,
}

impl Settings {
    /// Defaults for `environment` before any file or env override.
    #[must_use]
    pub fn defaults_for(environment: AppEnvironment) -> Self {
        match environment {
            AppEnvironment::Local => Self {
                environment,
                bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_PORT)),
                log_level: "debug".to_string(),
                log_format: LogFormat::Pretty,
                max_body_bytes: DEFAULT_MAX_BODY_BYTES,
                identity_header: None,
                media: None,
            },
            AppEnvironment::Live => Self {
                environment,
                bind_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_PORT)),
                log_level: "info".to_string(),
                log_format: LogFormat::Json,
                max_body_bytes: DEFAULT_MAX_BODY_BYTES,
                identity_header: None,
                media: None,
            },
        }
    }

    /// Whether the service runs with production defaults.
    #[must_use]
    pub const fn is_live(&self) -> bool {
        matches!(self.environment, AppEnvironment::Live)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::defaults_for(AppEnvironment::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_parses_case_insensitively() -> anyhow::Result<()> {
        assert_eq!("LIVE".parse::<AppEnvironment>()?, AppEnvironment::Live);
        assert_eq!("local".parse::<AppEnvironment>()?, AppEnvironment::Local);
        assert!(matches!(
            "staging".parse::<AppEnvironment>(),
            Err(ConfigError::InvalidEnvironment { value }) if value == "staging"
        ));
        Ok(())
    }

    #[test]
    fn live_defaults_differ_from_local() {
        let local = Settings::defaults_for(AppEnvironment::Local);
        let live = Settings::defaults_for(AppEnvironment::Live);
        assert!(local.bind_addr.ip().is_loopback());
        assert!(live.bind_addr.ip().is_unspecified());
        assert_eq!(local.log_format, LogFormat::Pretty);
        assert_eq!(live.log_format, LogFormat::Json);
        assert!(live.is_live());
        assert!(!local.is_live());
        assert_eq!(Settings::default(), local);
    }
}
