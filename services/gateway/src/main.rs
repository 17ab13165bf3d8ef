mod error;
mod handlers;
mod router;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::Notify;

use reconciler::Repository;
use router::create_router;
use state::AppState;

/// How long in-flight requests get to finish after a shutdown signal.
const DRAIN_DEADLINE: Duration = Duration::from_secs(5);

#[derive(Debug, Parser)]
#[command(name = "gateway", about = "Rocket telemetry ingestion and read API")]
struct Args {
    /// Port to listen on
    #[arg(long, default_value_t = 8088)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    tracing::info!("Starting rocket telemetry gateway");

    // Initialize application state
    let repository = Arc::new(Repository::with_defaults());
    let state = AppState::new(Arc::clone(&repository));

    // Create router
    let app = create_router(state);

    // Bind and serve
    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    let listener = TcpListener::bind(addr).await?;

    tracing::info!("Listening on {}", addr);

    let drain = Arc::new(Notify::new());
    let drain_trigger = Arc::clone(&drain);

    let server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { drain_trigger.notified().await })
            .await
    });

    shutdown_signal().await;
    tracing::info!("Shutdown signal received, draining in-flight requests");
    drain.notify_one();

    match tokio::time::timeout(DRAIN_DEADLINE, server).await {
        Ok(result) => result??,
        Err(_) => {
            tracing::warn!(
                deadline_secs = DRAIN_DEADLINE.as_secs(),
                "Drain deadline exceeded, exiting"
            );
        }
    }

    repository.close();
    tracing::info!("Server exited gracefully");
    Ok(())
}

/// Resolves when the process receives SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
