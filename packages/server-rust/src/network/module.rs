//! HTTP server with deferred startup.
//!
//! `new()` allocates shared state, `start()` binds the listener and
//! `serve()` accepts requests until the shutdown future resolves. Callers can
//! hand out the shutdown controller between `new()` and `serve()`.

use std::future::Future;
use std::sync::Arc;

use anyhow::Context;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tracing::{info, warn};

use super::config::{NetworkConfig, TlsConfig};
use super::handlers::{datasets, health_handler, liveness_handler, readiness_handler, AppState};
use super::middleware::apply_http_layers;
use super::shutdown::ShutdownController;
use crate::app::AppServices;

/// Owns the listener, the router state and the shutdown controller.
pub struct ServerModule {
    config: NetworkConfig,
    services: AppServices,
    listener: Option<TcpListener>,
    shutdown: Arc<ShutdownController>,
}

impl ServerModule {
    /// Prepares a server without binding anything.
    #[must_use]
    pub fn new(config: NetworkConfig, services: AppServices) -> Self {
        Self {
            config,
            services,
            listener: None,
            shutdown: Arc::new(ShutdownController::new()),
        }
    }

    #[must_use]
    pub fn shutdown_controller(&self) -> Arc<ShutdownController> {
        Arc::clone(&self.shutdown)
    }

    /// Routes:
    /// - `GET /health`, `GET /health/live`, `GET /health/ready`
    /// - `GET|POST /api/datasets`
    /// - `GET|PUT|PATCH|DELETE /api/datasets/{id}`
    pub fn build_router(&self) -> Router {
        let state = AppState::new(self.services.clone(), Arc::clone(&self.shutdown));

        let router = Router::new()
            .route("/health", get(health_handler))
            .route("/health/live", get(liveness_handler))
            .route("/health/ready", get(readiness_handler))
            .merge(datasets::routes())
            .with_state(state);

        apply_http_layers(router, &self.config, Arc::clone(&self.shutdown))
    }

    /// Binds the listener and returns the bound port.
    ///
    /// # Errors
    ///
    /// Fails if the address cannot be bound.
    pub async fn start(&mut self) -> anyhow::Result<u16> {
        let addr = self.config.bind_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("failed to bind {addr}"))?;
        let port = listener.local_addr()?.port();

        info!(host = %self.config.host, port, "listener bound");
        self.listener = Some(listener);
        Ok(port)
    }

    /// Serves until `shutdown` resolves, then drains in-flight requests for
    /// up to `drain_timeout`.
    ///
    /// # Errors
    ///
    /// Fails if `start()` was not called first, the TLS material cannot be
    /// loaded, or the server hits a fatal I/O error.
    pub async fn serve(
        mut self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> anyhow::Result<()> {
        let listener = self
            .listener
            .take()
            .context("start() must be called before serve()")?;
        let router = self.build_router();

        self.shutdown.set_ready();

        match &self.config.tls {
            Some(tls) => serve_tls(listener, router, tls, shutdown).await?,
            None => serve_plain(listener, router, shutdown).await?,
        }

        drain(&self.shutdown, &self.config).await;
        Ok(())
    }
}

async fn serve_plain(
    listener: TcpListener,
    router: Router,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    info!("serving HTTP");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

async fn serve_tls(
    listener: TcpListener,
    router: Router,
    tls: &TlsConfig,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    use axum_server::tls_rustls::RustlsConfig;

    let rustls = RustlsConfig::from_pem_file(&tls.cert_path, &tls.key_path)
        .await
        .context("failed to load TLS certificates")?;

    let addr = listener.local_addr()?;
    let handle = axum_server::Handle::new();
    let on_shutdown = handle.clone();
    tokio::spawn(async move {
        shutdown.await;
        on_shutdown.graceful_shutdown(None);
    });

    info!(%addr, "serving HTTPS");
    axum_server::from_tcp_rustls(listener.into_std()?, rustls)
        .handle(handle)
        .serve(router.into_make_service())
        .await?;
    Ok(())
}

async fn drain(shutdown: &ShutdownController, config: &NetworkConfig) {
    shutdown.trigger_shutdown();
    if shutdown.wait_for_drain(config.drain_timeout).await {
        info!("in-flight requests drained");
    } else {
        warn!(
            remaining = shutdown.in_flight_count(),
            "drain timeout expired with requests still in flight"
        );
    }
}
