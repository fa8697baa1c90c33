mod health;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Router, routing::get};
use soprano_config::Config;
use tower_http::trace::TraceLayer;

/// Listen address used when the configuration does not name one
pub const DEFAULT_LISTEN_ADDRESS: SocketAddr = SocketAddr::new(std::net::IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED), 8000);

/// Assembled server with all routes and middleware
pub struct Server {
    router: Router,
    listen_address: SocketAddr,
}

impl Server {
    /// Build the server from configuration
    ///
    /// Loads the speech model once; a model that fails to load leaves the
    /// server running with synthesis answering `503`.
    pub fn new(config: &Config) -> Self {
        let tts_state = tts::build_server(config);
        Self::with_tts(config, tts_state)
    }

    /// Build the server around an already constructed speech state
    ///
    /// Lets callers inject their own model, e.g. a fake one in tests.
    pub fn with_tts(config: &Config, tts_state: Arc<tts::Server>) -> Self {
        let listen_address = config.server.listen_address.unwrap_or(DEFAULT_LISTEN_ADDRESS);

        let mut speech = tts::endpoint_router();

        let health = &config.server.health;
        if health.enabled {
            speech = speech.route(&health.readiness_path, get(health::readiness_handler));
        }

        let mut app = Router::new().merge(speech.with_state(tts_state));

        if health.enabled {
            app = app.route(&health.path, get(health::health_handler));
        }

        app = app.layer(TraceLayer::new_for_http());

        Self {
            router: app,
            listen_address,
        }
    }

    /// Replace the configured listen address
    #[must_use]
    pub const fn with_listen_address(mut self, listen_address: SocketAddr) -> Self {
        self.listen_address = listen_address;
        self
    }

    /// Get the configured listen address
    #[must_use]
    pub const fn listen_address(&self) -> SocketAddr {
        self.listen_address
    }

    /// Consume the server and return the inner router
    ///
    /// Useful for testing when the caller manages the listener
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Start serving requests
    ///
    /// Blocks until the cancellation token is triggered.
    ///
    /// # Errors
    ///
    /// Returns an error if binding the TCP listener or serving fails
    pub async fn serve(self, shutdown: tokio_util::sync::CancellationToken) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.listen_address)
            .await
            .map_err(|e| anyhow::anyhow!("failed to bind {}: {e}", self.listen_address))?;
        let local_addr = listener.local_addr()?;
        tracing::info!(%local_addr, "server listening");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                shutdown.cancelled().await;
                tracing::info!("graceful shutdown initiated");
            })
            .await?;

        Ok(())
    }
}
