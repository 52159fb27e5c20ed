mod app;
mod config;
mod error;
mod room;
mod signaling;
mod transport;

pub use app::*;
pub use config::*;
pub use error::*;
pub use room::*;
pub use signaling::*;
pub use transport::*;

use std::future::Future;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::info;

/// How long shutdown waits for socket tasks to finish their cleanup.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Binds `config.socket_addr()` and serves until `shutdown` resolves.
pub async fn serve<F>(config: RelayConfig, shutdown: F) -> Result<(), RelayError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = config.socket_addr();
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| RelayError::Bind { addr, source })?;

    serve_listener(listener, RelayService::new(), &config, shutdown).await
}

/// Serves on an already bound listener. Every open connection goes through
/// the normal disconnect cleanup once `shutdown` resolves.
pub async fn serve_listener<F>(
    listener: TcpListener,
    service: RelayService,
    config: &RelayConfig,
    shutdown: F,
) -> Result<(), RelayError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    info!("Signaling server listening on http://{}", addr);

    let app = router(service.clone(), &config.allowed_origins);
    let stopping = service.clone();

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.await;
            info!(
                "Shutting down, closing {} connections",
                stopping.connection_count()
            );
            stopping.shutdown();
        })
        .await?;

    service.wait_idle(SHUTDOWN_GRACE).await;
    info!("Signaling server stopped");
    Ok(())
}
