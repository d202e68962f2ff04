#![doc = include_str!("../README.md")]

mod server;

use clap::Parser;
use core::time::Duration;
use server::config::{CliArgs, ServerConfig};
use server::service::handler::{HashService, build_router};
use server::telemetry::init_telemetry;
use tokio::net::TcpListener;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};

// Using mimalloc for better performance under contention, especially in musl
// environments.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = ServerConfig::try_from(args)?;

    let providers = init_telemetry()?;

    let listener = TcpListener::bind(config.server_addr).await?;
    log_startup_info(&config);

    let res = run_server(listener, &config).await;

    providers.shutdown();
    res
}

async fn run_server(listener: TcpListener, config: &ServerConfig) -> anyhow::Result<()> {
    let service = HashService::new(config);
    let shutdown_token = service.shutdown_token();

    let app = build_router(service.clone()).layer(
        ServiceBuilder::new().layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        ),
    );
    #[cfg(feature = "tracing")]
    let app = app.layer(tower_http::trace::TraceLayer::new_for_http());

    tokio::spawn(shutdown_signal(service));

    let server = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_token.clone().cancelled_owned())
        .into_future();
    let drain_timeout = Duration::from_secs(config.shutdown_timeout);

    tokio::select! {
        res = server => res?,
        () = async {
            shutdown_token.cancelled().await;
            tokio::time::sleep(drain_timeout).await;
        } => {
            #[cfg(feature = "tracing")]
            tracing::warn!(
                "Graceful drain timed out after {}s, dropping remaining connections",
                drain_timeout.as_secs()
            );
        }
    }

    #[cfg(feature = "tracing")]
    tracing::info!("Service shut down successfully");
    Ok(())
}

fn log_startup_info(_config: &ServerConfig) {
    if cfg!(debug_assertions) {
        #[cfg(feature = "tracing")]
        tracing::info!(
            "Starting hash service on {} with full config: {:#?}",
            _config.server_addr,
            _config
        );
    } else {
        #[cfg(feature = "tracing")]
        tracing::info!(
            "Starting hash service on {} with {} workers",
            _config.server_addr,
            _config.num_workers
        );
    }
}

/// Waits for Ctrl+C or SIGTERM, then cancels in-flight batches and lets the
/// server stop accepting connections.
async fn shutdown_signal(service: HashService) {
    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    tokio::select! {
        () = ctrl_c => {
            #[cfg(feature = "tracing")]
            tracing::info!("Received Ctrl+C signal");
        },
        () = terminate => {
            #[cfg(feature = "tracing")]
            tracing::info!("Received SIGTERM signal");
        },
    }

    #[cfg(feature = "tracing")]
    tracing::info!("Shutdown signal received, terminating gracefully...");

    service.shutdown();
}
