use anyhow::Context;
use clap::Parser;
use snip_core::Shortener;
use snip_gateway::cli::{Cli, StorageBackendArg};
use snip_gateway::{logging, startup, App, AppState};
use snip_generator::{RandomGenerator, RandomGeneratorSettings};
use snip_shortener::ShortenerService;
use snip_storage::{InMemoryRepository, RedisOptions};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Cli::parse();
    logging::init(config.log_format);

    info!(
        listen_addr = %config.listen_addr,
        public_base_url = %config.public_base_url,
        storage_backend = %config.storage,
        code_length = config.code_length,
        "starting snip gateway"
    );

    let generator = RandomGenerator::new(
        RandomGeneratorSettings::builder()
            .length(config.code_length)
            .build(),
    )?;

    let shortener: Arc<dyn Shortener> = match config.storage {
        StorageBackendArg::InMemory => Arc::new(
            ShortenerService::new(InMemoryRepository::new(), generator)
                .with_max_attempts(config.max_attempts),
        ),
        StorageBackendArg::Redis => {
            let options = RedisOptions::builder()
                .command_timeout(config.store_timeout())
                .namespace(config.redis_namespace.as_str())
                .build();
            let repository = startup::connect_when_ready(
                &config.redis_url,
                options,
                config.store_ready_timeout(),
            )
            .await
            .context("store did not become ready")?;
            Arc::new(
                ShortenerService::new(repository, generator)
                    .with_max_attempts(config.max_attempts),
            )
        }
    };

    let app = App::router(AppState::new(shortener, config.public_base_url));

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    info!(listen_addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
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
                tracing::error!(error = %e, "failed to listen for SIGTERM");
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

    info!("shutdown signal received, draining connections");
}
