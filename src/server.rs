//! HTTP server lifecycle.
//!
//! Binding, serving in a background task, and graceful shutdown on request
//! or on Ctrl+C / SIGTERM.

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use hyper_util::rt::{TokioExecutor, TokioIo, TokioTimer};
use hyper_util::server::conn::auto;
use hyper_util::server::graceful::GracefulShutdown;
use hyper_util::service::TowerToHyperService;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::api::routes::create_router;
use crate::config::{Environment, ServerConfig, Settings};
use crate::state::AppState;
use crate::webhook::{Dispatcher, Registry};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Failed to bind to {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },

    #[error("Server error: {0}")]
    Serve(#[from] io::Error),
}

/// HTTP server manager
pub struct Server {
    settings: Settings,
    registry: Arc<Registry>,
}

impl Server {
    pub fn new(settings: Settings, registry: Arc<Registry>) -> Self {
        Self { settings, registry }
    }

    /// Router serving the configured registry.
    pub fn router(&self) -> Router {
        let state = AppState::new(
            Dispatcher::new(self.registry.clone()),
            self.settings.application.name.clone(),
            self.settings.application.version.clone(),
        );
        create_router(state, &self.settings.server)
    }

    /// Binds the listener and starts serving in a background task.
    ///
    /// Port 0 picks a free port; read it back with
    /// [`ServerHandle::local_addr`]. Dropping the handle stops the server.
    pub async fn bind(self) -> Result<ServerHandle, ServerError> {
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let (local_addr, task) = self
            .spawn(async move {
                let _ = shutdown_rx.await;
            })
            .await?;

        Ok(ServerHandle {
            local_addr,
            shutdown: Some(shutdown_tx),
            task,
        })
    }

    /// Serves until Ctrl+C or SIGTERM, then drains in-flight requests.
    pub async fn run(self) -> Result<(), ServerError> {
        tracing::info!(
            app_name = %self.settings.application.name,
            app_version = %self.settings.application.version,
            environment = %Environment::from_env().as_str(),
            "Application starting"
        );

        tracing::info!(
            host = %self.settings.server.host,
            port = self.settings.server.port,
            request_timeout = self.settings.server.request_timeout,
            idle_timeout = self.settings.server.idle_timeout,
            body_limit = self.settings.server.body_limit,
            "Server configuration loaded"
        );

        tracing::info!(providers = ?self.registry.providers(), "Providers registered");

        let (_, task) = self.spawn(shutdown_signal()).await?;
        let result = join(task).await;

        tracing::info!("Server shutdown complete");
        result
    }

    async fn spawn<F>(
        self,
        signal: F,
    ) -> Result<(SocketAddr, JoinHandle<io::Result<()>>), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let router = self.router();
        let address = self.settings.server.address();

        let listener = TcpListener::bind(&address).await.map_err(|e| {
            tracing::error!(error = %e, address = %address, "Failed to bind to address");
            ServerError::Bind {
                address: address.clone(),
                source: e,
            }
        })?;
        let local_addr = listener.local_addr()?;

        tracing::info!(address = %local_addr, "Server listening");

        let limits = ConnectionLimits::from(&self.settings.server);
        let task = tokio::spawn(serve(listener, router, limits, signal));

        Ok((local_addr, task))
    }
}

/// Per-connection timeouts.
#[derive(Debug, Clone, Copy)]
struct ConnectionLimits {
    /// Time allowed to receive a request head, including the wait for the
    /// next request on a kept-alive connection
    idle: Duration,
    /// Upper bound on draining in-flight requests at shutdown
    drain: Duration,
}

impl From<&ServerConfig> for ConnectionLimits {
    fn from(config: &ServerConfig) -> Self {
        Self {
            idle: config.idle_timeout(),
            drain: config.request_timeout(),
        }
    }
}

/// Accept loop serving `router` until `signal` resolves.
///
/// Connections that send no request head within `limits.idle` are closed,
/// whether freshly opened or idle between keep-alive requests. Reading the
/// body and running the handler is bounded separately by the router's
/// request timeout.
async fn serve<F>(
    listener: TcpListener,
    router: Router,
    limits: ConnectionLimits,
    signal: F,
) -> io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let mut builder = auto::Builder::new(TokioExecutor::new());
    builder
        .http1()
        .timer(TokioTimer::new())
        .header_read_timeout(limits.idle)
        .keep_alive(true);
    builder.http2().timer(TokioTimer::new());

    let graceful = GracefulShutdown::new();
    tokio::pin!(signal);

    loop {
        let (stream, peer) = tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok(accepted) => accepted,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to accept connection");
                    continue;
                }
            },
            _ = &mut signal => break,
        };

        let service = TowerToHyperService::new(router.clone());
        let connection = builder
            .serve_connection_with_upgrades(TokioIo::new(stream), service)
            .into_owned();
        let connection = graceful.watch(connection);

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::debug!(peer = %peer, error = %e, "Connection closed with error");
            }
        });
    }

    drop(listener);

    if tokio::time::timeout(limits.drain, graceful.shutdown())
        .await
        .is_err()
    {
        tracing::warn!(
            timeout_secs = limits.drain.as_secs(),
            "Connections still open after shutdown timeout"
        );
    }

    Ok(())
}

/// Handle to a server started with [`Server::bind`].
#[derive(Debug)]
pub struct ServerHandle {
    local_addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<io::Result<()>>,
}

impl ServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Asks the server to stop accepting connections. Idempotent.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }

    /// Resolves once the listener has terminated.
    pub async fn wait(self) -> Result<(), ServerError> {
        let Self {
            shutdown, task, ..
        } = self;
        // Dropping the sender here would stop the server.
        let _shutdown = shutdown;
        join(task).await
    }
}

async fn join(task: JoinHandle<io::Result<()>>) -> Result<(), ServerError> {
    match task.await {
        Ok(result) => result.map_err(ServerError::Serve),
        Err(e) => Err(ServerError::Serve(io::Error::other(e))),
    }
}

/// Waits for Ctrl+C or SIGTERM.
///
/// If a handler cannot be installed the error is logged and that signal is
/// ignored.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
