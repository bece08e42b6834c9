//! Libris Server - Library catalog engine
//!
//! Reads one JSON request per line and answers with one JSON response per
//! line, on stdio or over TCP. Logs go to stderr so stdout stays a clean
//! protocol channel.

use std::net::SocketAddr;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use libris_server::{
    api::{server, Dispatcher},
    config::{AppConfig, LoggingConfig, Transport},
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    let _guard = init_tracing(&config.logging);

    tracing::info!("Starting Libris Server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Delete policy: {:?}, transport: {:?}",
        config.catalog.delete_policy,
        config.server.transport
    );

    let transport = config.server.transport;
    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);

    let state = AppState::initialize(config).await?;
    let dispatcher = Dispatcher::new(state);

    let serve = async {
        match transport {
            Transport::Stdio => server::serve_stdio(dispatcher).await,
            Transport::Tcp => server::serve_tcp(addr, dispatcher).await,
        }
    };

    tokio::select! {
        result = serve => result?,
        _ = tokio::signal::ctrl_c() => tracing::info!("Shutdown signal received"),
    }

    tracing::info!("Libris Server stopped");
    Ok(())
}

/// Install the subscriber; the returned guard flushes the log file on drop
fn init_tracing(logging: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = || {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| format!("libris_server={}", logging.level).into())
    };

    let stderr_layer = if logging.format == "json" {
        fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_filter(filter())
            .boxed()
    } else {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_filter(filter())
            .boxed()
    };

    let (file_layer, guard) = match &logging.directory {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, "libris.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(filter())
                .boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .init();

    guard
}
