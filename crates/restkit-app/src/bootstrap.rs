use std::future::{Future, pending};
use std::sync::Arc;

use restkit_api::{ApiServer, ApiState};
use restkit_config::Settings;
use restkit_errors::ExceptionRegistry;
use restkit_runtime::BackgroundExecutor;
use restkit_storage::{CloudinaryUploader, Delivery, MediaStorage};
use restkit_telemetry::{GlobalContextGuard, LoggingConfig, build_sha, init_logging};
use tracing::{info, warn};

use crate::error::{AppError, AppResult};

/// Entry point for the service boot sequence.
///
/// Settings come from the process environment; the server stops on Ctrl-C.
///
/// # Errors
///
/// Returns an error if settings cannot be resolved or application startup fails.
pub async fn run_app() -> AppResult<()> {
    let settings = Settings::load().map_err(|err| AppError::config("settings.load", err))?;
    run_app_with(settings, shutdown_signal()).await
}

/// Boot with explicit settings, serving until `shutdown` resolves.
///
/// # Errors
///
/// Returns an error if logging cannot be installed, the server cannot be
/// built, or the listener fails.
pub async fn run_app_with<F>(settings: Settings, shutdown: F) -> AppResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    init_logging(&LoggingConfig {
        level: &settings.log_level,
        format: settings.log_format,
        build_sha: build_sha(),
    })
    .map_err(|err| AppError::telemetry("telemetry.init", err))?;
    let _context = GlobalContextGuard::new(settings.environment.as_str());

    info!("restkit bootstrap starting");
    serve_until(&settings, shutdown).await
}

/// Build the API server described by `settings`.
///
/// Media endpoints are mounted only when media credentials are configured.
///
/// # Errors
///
/// Returns an error if the exception taxonomy or the API state is invalid.
pub fn build_server(settings: &Settings, executor: BackgroundExecutor) -> AppResult<ApiServer> {
    let registry = ExceptionRegistry::standard()
        .map_err(|err| AppError::registry("registry.standard", err))?;
    let mut state = ApiState::new(settings, Arc::new(registry), executor)
        .map_err(|err| AppError::api_server("api_state.new", err))?;
    if let Some(media) = &settings.media {
        info!(cloud_name = %media.cloud_name, "media storage enabled");
        let uploader = CloudinaryUploader::new(media.clone());
        let storage = MediaStorage::new(Arc::new(uploader), Delivery::new(media.cloud_name.clone()))
            .with_download_limit(media.max_download_bytes);
        state = state.with_media(storage);
    }
    ApiServer::new(state).map_err(|err| AppError::api_server("api_server.new", err))
}

async fn serve_until<F>(settings: &Settings, shutdown: F) -> AppResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let executor = BackgroundExecutor::new();
    let api = build_server(settings, executor.clone())?;

    info!(
        addr = %settings.bind_addr,
        environment = settings.environment.as_str(),
        "Launching API listener"
    );
    let served = api
        .serve_with_shutdown(settings.bind_addr, shutdown)
        .await
        .map_err(|err| AppError::api_server("api_server.serve", err));

    executor.shutdown().await;
    info!("restkit stopped");
    served
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for the shutdown signal");
        pending::<()>().await;
    }
    info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, SocketAddr};

    use restkit_config::MediaSettings;

    fn local_settings() -> Settings {
        Settings {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 0)),
            ..Settings::default()
        }
    }

    #[test]
    fn server_builds_without_media() -> anyhow::Result<()> {
        build_server(&local_settings(), BackgroundExecutor::new())?;
        Ok(())
    }

    #[test]
    fn server_builds_with_media_credentials() -> anyhow::Result<()> {
        let settings = Settings {
            media: Some(MediaSettings {
                cloud_name: "demo".to_string(),
                api_key: "key".to_string(),
                api_secret: "secret".to_string(),
                api_base_url: MediaSettings::DEFAULT_API_BASE_URL.to_string(),
                max_download_bytes: 1024,
            }),
            ..local_settings()
        };
        build_server(&settings, BackgroundExecutor::new())?;
        Ok(())
    }

    #[test]
    fn invalid_identity_header_fails_startup() {
        let settings = Settings {
            identity_header: Some("not a header".to_string()),
            ..local_settings()
        };
        let result = build_server(&settings, BackgroundExecutor::new());
        assert!(matches!(
            result,
            Err(AppError::ApiServer {
                operation: "api_state.new",
                ..
            })
        ));
    }

    #[tokio::test]
    async fn server_stops_when_shutdown_resolves() -> anyhow::Result<()> {
        serve_until(&local_settings(), async {}).await?;
        Ok(())
    }

    #[tokio::test]
    async fn occupied_address_is_reported() -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await?;
        let settings = Settings {
            bind_addr: listener.local_addr()?,
            ..Settings::default()
        };
        let result = serve_until(&settings, async {}).await;
        assert!(matches!(
            result,
            Err(AppError::ApiServer {
                operation: "api_server.serve",
                ..
            })
        ));
        Ok(())
    }
}
