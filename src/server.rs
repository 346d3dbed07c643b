//! HTTP service lifecycle and graceful shutdown.
//!
//! A [`Service`] owns the [`Router`] and a listening socket. [`Service::start`]
//! binds `0.0.0.0:{port}`, writes a startup line to the configured sink and
//! then blocks in the accept loop until a shutdown signal arrives or the bind
//! fails. Nothing is retried.
//!
//! # Graceful shutdown and Kubernetes
//!
//! On **SIGTERM** or Ctrl-C the service:
//! 1. Immediately stops `listener.accept()`, so no new connections are made.
//! 2. Lets every in-flight connection task run to completion.
//! 3. Returns `Ok(())` from [`Service::start`], which lets `main` exit cleanly.

use std::convert::Infallible;
use std::future::Future;
use std::io::Write;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::StatusCode;
use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo, TokioTimer};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::config;
use crate::error::Error;
use crate::request::Request;
use crate::response::Response;
use crate::router::Router;

/// Port used when none (or `0`) is configured.
pub const DEFAULT_PORT: u16 = 80;

/// Settings for a [`Service`].
///
/// ```rust
/// use std::time::Duration;
/// use trellis::ServiceConfig;
///
/// let config = ServiceConfig::default()
///     .port(8080)
///     .timeout(Duration::from_secs(15))
///     .writer(std::io::stdout());
/// ```
#[derive(Default)]
pub struct ServiceConfig {
    /// `0` means [`DEFAULT_PORT`].
    pub port: u16,
    /// Shared read / write / idle timeout. Zero disables it.
    pub timeout: Duration,
    /// Receives one human-readable line before the accept loop starts.
    pub writer: Option<Box<dyn Write + Send>>,
}

impl ServiceConfig {
    /// Reads `PORT` and `TIMEOUT_SECS`, falling back to port 80 and no timeout.
    pub fn from_env() -> Self {
        let port = u16::try_from(config::int_env("PORT", i64::from(DEFAULT_PORT)))
            .unwrap_or(DEFAULT_PORT);
        Self {
            port,
            timeout: config::duration_secs_env("TIMEOUT_SECS", Duration::ZERO),
            writer: None,
        }
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn writer(mut self, writer: impl Write + Send + 'static) -> Self {
        self.writer = Some(Box::new(writer));
        self
    }
}

/// The HTTP service.
pub struct Service {
    port: u16,
    timeout: Option<Duration>,
    writer: Option<Box<dyn Write + Send>>,
    router: Arc<Router>,
}

impl Service {
    /// Takes ownership of `router`; registration is over from here on.
    pub fn new(config: ServiceConfig, router: Router) -> Self {
        let port = if config.port == 0 { DEFAULT_PORT } else { config.port };
        let timeout = (!config.timeout.is_zero()).then_some(config.timeout);
        Self { port, timeout, writer: config.writer, router: Arc::new(router) }
    }

    /// The port [`start`](Service::start) binds.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Binds `0.0.0.0:{port}` and serves until SIGTERM / Ctrl-C.
    ///
    /// Returns the bind error, if any, without retrying.
    pub async fn start(self) -> Result<(), Error> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| Error::Bind { addr, source })?;
        self.serve(listener, shutdown_signal()).await
    }

    /// Serves connections from an already bound `listener` until `shutdown`
    /// resolves, then drains in-flight connections.
    pub async fn serve(
        self,
        listener: TcpListener,
        shutdown: impl Future<Output = ()>,
    ) -> Result<(), Error> {
        let Self { timeout, writer, router, .. } = self;
        let addr = listener.local_addr()?;

        if let Some(mut writer) = writer {
            let line = format!("Service is starting on port {}\n", addr.port());
            if let Err(e) = writer.write_all(line.as_bytes()).and_then(|()| writer.flush()) {
                debug!("startup message not written: {e}");
            }
        }

        let mut builder = ConnBuilder::new(TokioExecutor::new());
        if let Some(timeout) = timeout {
            builder
                .http1()
                .timer(TokioTimer::new())
                .header_read_timeout(timeout);
            // HTTP/2 has no header-read timeout; an idle or dead peer is caught
            // by keep-alive pings instead.
            builder
                .http2()
                .timer(TokioTimer::new())
                .keep_alive_interval(timeout)
                .keep_alive_timeout(timeout);
        }
        let builder = Arc::new(builder);

        info!(%addr, "trellis listening");

        let mut tasks = tokio::task::JoinSet::new();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                // Check shutdown first so a signal stops accepting at once,
                // even with connections still queued.
                biased;

                () = &mut shutdown => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                    break;
                }

                res = listener.accept() => {
                    let (stream, peer) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let router = Arc::clone(&router);
                    let builder = Arc::clone(&builder);
                    let io = TokioIo::new(stream);

                    tasks.spawn(async move {
                        // Called once per request on the connection.
                        let svc = service_fn(move |req| {
                            let router = Arc::clone(&router);
                            async move {
                                Ok::<_, Infallible>(respond(router, req, timeout).await.into_inner())
                            }
                        });

                        if let Err(e) = builder.serve_connection(io, svc).await {
                            error!(%peer, "connection error: {e}");
                        }
                    });
                }

                // Reap finished connection tasks so the set stays bounded.
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        while tasks.join_next().await.is_some() {}

        info!("trellis stopped");
        Ok(())
    }
}

// ── Request handling ──────────────────────────────────────────────────────────

/// Buffers the body, dispatches, and enforces the per-request deadline.
///
/// Every failure becomes a response; hyper never sees an error.
async fn respond(
    router: Arc<Router>,
    req: hyper::Request<Incoming>,
    timeout: Option<Duration>,
) -> Response {
    let work = async {
        let (parts, body) = req.into_parts();
        let body: Bytes = match body.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(e) => {
                debug!("request body unreadable: {e}");
                return Response::status(StatusCode::BAD_REQUEST);
            }
        };
        router.dispatch(Request::from(http::Request::from_parts(parts, body))).await
    };

    match timeout {
        None => work.await,
        Some(limit) => match tokio::time::timeout(limit, work).await {
            Ok(res) => res,
            Err(_) => {
                warn!(?limit, "request exceeded timeout");
                Response::status(StatusCode::SERVICE_UNAVAILABLE)
            }
        },
    }
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first SIGTERM or Ctrl-C. A handler that fails to install
/// is logged and never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("ctrl-c handler unavailable: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(e) => {
                error!("SIGTERM handler unavailable: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c  => {}
        () = sigterm => {}
    }
}
