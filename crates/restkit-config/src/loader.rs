//! Settings resolution: environment defaults, then an optional YAML file,
//! then individual environment variables.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use restkit_telemetry::LogFormat;
use serde::Deserialize;

use crate::error::{ConfigError, ConfigResult};
use crate::model::{AppEnvironment, MediaSettings, Settings};

/// Selects the environment profile (`local` or `live`).
pub const ENV_ENVIRONMENT: &str = "RESTKIT_ENV";
/// Path of an optional YAML settings file.
pub const ENV_CONFIG_FILE: &str = "RESTKIT_CONFIG";
/// Overrides the bind address.
pub const ENV_BIND_ADDR: &str = "RESTKIT_BIND_ADDR";
/// Overrides the log filter directive.
pub const ENV_LOG_LEVEL: &str = "RESTKIT_LOG_LEVEL";
/// Overrides the log format.
pub const ENV_LOG_FORMAT: &str = "RESTKIT_LOG_FORMAT";
/// Overrides the request body cap.
pub const ENV_MAX_BODY_BYTES: &str = "RESTKIT_MAX_BODY_BYTES";
/// Names the header carrying caller identity.
pub const ENV_IDENTITY_HEADER: &str = "RESTKIT_IDENTITY_HEADER";
/// Media store account name.
pub const ENV_CLOUDINARY_CLOUD_NAME: &str = "CLOUDINARY_CLOUD_NAME";
/// Media store API key.
pub const ENV_CLOUDINARY_API_KEY: &str = "CLOUDINARY_API_KEY";
/// Media store API secret.
pub const ENV_CLOUDINARY_API_SECRET: &str = "CLOUDINARY_API_SECRET";
/// Media store upload API base URL.
pub const ENV_CLOUDINARY_API_BASE_URL: &str = "CLOUDINARY_API_BASE_URL";
/// Overrides the cap on pictures fetched from a URL.
pub const ENV_MEDIA_MAX_DOWNLOAD_BYTES: &str = "RESTKIT_MEDIA_MAX_DOWNLOAD_BYTES";

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    environment: Option<AppEnvironment>,
    bind_addr: Option<String>,
    log_level: Option<String>,
    log_format: Option<LogFormat>,
    max_body_bytes: Option<usize>,
    identity_header: Option<String>,
    #[serde(default)]
    media: FileMedia,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileMedia {
    cloud_name: Option<String>,
    api_key: Option<String>,
    api_secret: Option<String>,
    api_base_url: Option<String>,
    max_download_bytes: Option<usize>,
}

impl Settings {
    /// Resolve settings from the process environment.
    ///
    /// # Errors
    ///
    /// See [`Settings::from_lookup`].
    pub fn load() -> ConfigResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve settings using `lookup` in place of the process environment.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the settings file cannot be read or
    /// parsed, when a value is malformed, or when media credentials are only
    /// partially supplied.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let file = match lookup(ENV_CONFIG_FILE) {
            Some(path) => read_file(Path::new(&path))?,
            None => FileSettings::default(),
        };

        let environment = match lookup(ENV_ENVIRONMENT) {
            Some(value) => value.parse()?,
            None => file.environment.unwrap_or_default(),
        };
        let mut settings = Self::defaults_for(environment);

        if let Some(value) = lookup(ENV_BIND_ADDR).or(file.bind_addr) {
            settings.bind_addr = parse_bind_addr(&value)?;
        }
        if let Some(value) = lookup(ENV_LOG_LEVEL).or(file.log_level) {
            settings.log_level = value;
        }
        if let Some(value) = lookup(ENV_LOG_FORMAT) {
            settings.log_format = value.parse().map_err(|_| ConfigError::InvalidField {
                field: "log_format",
                value,
                reason: "expected_json_or_pretty",
            })?;
        } else if let Some(format) = file.log_format {
            settings.log_format = format;
        }
        if let Some(value) = lookup(ENV_MAX_BODY_BYTES) {
            settings.max_body_bytes = parse_byte_limit("max_body_bytes", &value)?;
        } else if let Some(limit) = file.max_body_bytes {
            settings.max_body_bytes = parse_byte_limit("max_body_bytes", &limit.to_string())?;
        }
        settings.identity_header = lookup(ENV_IDENTITY_HEADER)
            .or(file.identity_header)
            .map(|header| header.trim().to_ascii_lowercase());

        settings.media = resolve_media(
            lookup(ENV_CLOUDINARY_CLOUD_NAME).or(file.media.cloud_name),
            lookup(ENV_CLOUDINARY_API_KEY).or(file.media.api_key),
            lookup(ENV_CLOUDINARY_API_SECRET).or(file.media.api_secret),
            lookup(ENV_CLOUDINARY_API_BASE_URL).or(file.media.api_base_url),
        )?;
        if let Some(media) = settings.media.as_mut() {
            if let Some(value) = lookup(ENV_MEDIA_MAX_DOWNLOAD_BYTES) {
                media.max_download_bytes = parse_byte_limit("max_download_bytes", &value)?;
            } else if let Some(limit) = file.media.max_download_bytes {
                media.max_download_bytes =
                    parse_byte_limit("max_download_bytes", &limit.to_string())?;
            }
        }

        tracing::debug!(
            environment = %settings.environment,
            bind_addr = %settings.bind_addr,
            media = settings.media.is_some(),
            "settings resolved"
        );
        Ok(settings)
    }
}

fn read_file(path: &Path) -> ConfigResult<FileSettings> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: PathBuf::from(path),
        source,
    })?;
    if raw.trim().is_empty() {
        return Ok(FileSettings::default());
    }
    serde_yaml::from_str(&raw).map_err(|source| ConfigError::ParseFile {
        path: PathBuf::from(path),
        source,
    })
}

fn parse_bind_addr(value: &str) -> ConfigResult<SocketAddr> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidBindAddr {
            value: value.to_string(),
        })
}

fn parse_byte_limit(field: &'static str, value: &str) -> ConfigResult<usize> {
    match value.trim().parse::<usize>() {
        Ok(0) => Err(ConfigError::InvalidField {
            field,
            value: value.to_string(),
            reason: "must_be_positive",
        }),
        Ok(limit) => Ok(limit),
        Err(_) => Err(ConfigError::InvalidField {
            field,
            value: value.to_string(),
            reason: "not_an_integer",
        }),
    }
}

fn resolve_media(
    cloud_name: Option<String>,
    api_key: Option<String>,
    api_secret: Option<String>,
    api_base_url: Option<String>,
) -> ConfigResult<Option<MediaSettings>> {
    match (cloud_name, api_key, api_secret) {
        (None, None, None) => Ok(None),
        (Some(cloud_name), Some(api_key), Some(api_secret)) => Ok(Some(MediaSettings {
            cloud_name,
            api_key,
            api_secret,
            api_base_url: api_base_url
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| MediaSettings::DEFAULT_API_BASE_URL.to_string()),
            max_download_bytes: MediaSettings::DEFAULT_MAX_DOWNLOAD_BYTES,
        })),
        (None, _, _) => Err(ConfigError::IncompleteMedia {
            missing: "cloud_name",
        }),
        (_, None, _) => Err(ConfigError::IncompleteMedia { missing: "api_key" }),
        (_, _, None) => Err(ConfigError::IncompleteMedia {
            missing: "api_secret",
        }),
    }
}
