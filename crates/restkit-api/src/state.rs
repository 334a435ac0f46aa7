//! Shared state handed to middleware and built-in endpoints.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::http::HeaderName;
use restkit_config::{AppEnvironment, Settings};
use restkit_errors::ExceptionRegistry;
use restkit_runtime::BackgroundExecutor;
use restkit_storage::MediaStorage;

/// Dependencies shared by every request.
pub struct ApiState {
    registry: Arc<ExceptionRegistry>,
    environment: AppEnvironment,
    max_body_bytes: usize,
    identity_header: Option<HeaderName>,
    executor: BackgroundExecutor,
    media: Option<MediaStorage>,
}

impl ApiState {
    /// Build state from resolved settings.
    ///
    /// # Errors
    ///
    /// Returns an error when the configured identity header is not a valid
    /// header name.
    pub fn new(
        settings: &Settings,
        registry: Arc<ExceptionRegistry>,
        executor: BackgroundExecutor,
    ) -> Result<Self> {
        let identity_header = settings
            .identity_header
            .as_deref()
            .map(|name| {
                HeaderName::from_bytes(name.as_bytes())
                    .with_context(|| format!("invalid identity header name {name:?}"))
            })
            .transpose()?;
        Ok(Self {
            registry,
            environment: settings.environment,
            max_body_bytes: settings.max_body_bytes,
            identity_header,
            executor,
            media: None,
        })
    }

    /// Enable the media endpoints backed by `media`.
    #[must_use]
    pub fn with_media(mut self, media: MediaStorage) -> Self {
        self.media = Some(media);
        self
    }

    /// Exception registry used for translation.
    #[must_use]
    pub fn registry(&self) -> &ExceptionRegistry {
        &self.registry
    }

    /// Active environment.
    #[must_use]
    pub const fn environment(&self) -> AppEnvironment {
        self.environment
    }

    /// Largest accepted request body.
    #[must_use]
    pub const fn max_body_bytes(&self) -> usize {
        self.max_body_bytes
    }

    /// Header naming the caller, when identity is forwarded.
    #[must_use]
    pub const fn identity_header(&self) -> Option<&HeaderName> {
        self.identity_header.as_ref()
    }

    /// Executor for detached work.
    #[must_use]
    pub const fn executor(&self) -> &BackgroundExecutor {
        &self.executor
    }

    /// Media storage, when configured.
    #[must_use]
    pub const fn media(&self) -> Option<&MediaStorage> {
        self.media.as_ref()
    }
}
