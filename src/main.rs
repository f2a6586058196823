use std::future::IntoFuture;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::ServiceExt;
use axum::extract::Request;
use tokio::net::TcpListener;

use parakeet_gateway::application::ports::ModelLoadError;
use parakeet_gateway::application::services::{
    ModelSession, SecurityGate, TranscriptionPipeline, UploadValidator,
};
use parakeet_gateway::infrastructure::audio::{ModelLoaderFactory, SymphoniaAudioNormalizer};
use parakeet_gateway::infrastructure::observability::{TracingConfig, init_tracing};
use parakeet_gateway::presentation::{AppState, Environment, Settings, create_app};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let environment = Environment::from_env()?;
    let settings = Settings::load(environment).context("Failed to load configuration")?;

    init_tracing(
        TracingConfig::from_settings(&settings.logging, environment),
        settings.server.port,
    );

    let loader = ModelLoaderFactory::create(
        settings.model.provider,
        settings.model.remote_api_key.clone(),
        settings.model.remote_base_url.clone(),
    )
    .context("Failed to create model loader")?;

    let session = ModelSession::new(
        settings.model.model_id.clone(),
        loader,
        settings.model.checksum_sha256.clone(),
    );

    let temp_dir = settings
        .upload
        .temp_dir
        .as_ref()
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::temp_dir().join("parakeet-gateway"));
    let normalizer = SymphoniaAudioNormalizer::new(temp_dir)
        .context("Failed to prepare upload temp directory")?;

    let pipeline = TranscriptionPipeline::new(
        UploadValidator::new(settings.upload.max_file_size_bytes()),
        Arc::new(normalizer),
        session.clone(),
        settings
            .model
            .inference_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs),
    );

    let security = SecurityGate::new(
        settings.security.api_key.clone(),
        settings.security.cors_origins.clone(),
        settings.security.strict_origin,
    );
    if !security.requires_api_key() {
        tracing::warn!("No API key configured, the transcription endpoint is open to anyone");
    }

    let state = AppState {
        pipeline: Arc::new(pipeline),
        security: Arc::new(security),
        default_language: settings.model.default_language.clone(),
    };

    let app = create_app(state);

    let host: std::net::IpAddr = settings
        .server
        .host
        .parse()
        .with_context(|| format!("Invalid server host: {}", settings.server.host))?;
    let addr = SocketAddr::new(host, settings.server.port);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(
        address = %addr,
        model = %settings.model.model_id,
        provider = ?settings.model.provider,
        "Listening"
    );

    let server = axum::serve(listener, ServiceExt::<Request>::into_make_service(app)).with_graceful_shutdown(shutdown_signal());

    if settings.model.preload {
        tokio::select! {
            result = server.into_future() => result.context("Server error")?,
            error = preload(session) => {
                return Err(anyhow::Error::new(error).context("Model preload failed"));
            }
        }
    } else {
        server.await.context("Server error")?;
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Resolves only on a fatal load failure; otherwise stays pending so the
/// server keeps running and retries on the next request.
async fn preload(session: ModelSession) -> ModelLoadError {
    match session.ensure_loaded().await {
        Err(error) if error.is_fatal() => error,
        Err(error) => {
            tracing::warn!(error = %error, "Model preload failed, will retry on first request");
            std::future::pending().await
        }
        Ok(_) => std::future::pending().await,
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
