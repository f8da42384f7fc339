//! Web server for Boards.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::compression::CompressionLayer;

use crate::config::Config;
use crate::db::SessionRepository;
use crate::mail::Mailer;
use crate::{BoardsError, Database, Result};

use super::handlers::AppState;
use super::middleware::RateLimitState;
use super::router::{create_health_router, create_router};

/// How often expired sessions and stale login failures are purged.
const SESSION_CLEANUP_INTERVAL_SECS: u64 = 3600;

/// Web server for the site.
pub struct WebServer {
    /// Server address.
    addr: SocketAddr,
    /// Application state.
    app_state: Arc<AppState>,
    /// Per-IP form rate limits.
    rate_limits: Arc<RateLimitState>,
}

impl WebServer {
    /// Create a new web server.
    pub fn new(config: Config, db: Database, mailer: Arc<dyn Mailer>) -> Result<Self> {
        let addr = format!("{}:{}", config.server.host, config.server.port)
            .parse()
            .map_err(|e| BoardsError::Config(format!("invalid server address: {e}")))?;

        let rate_limits = Arc::new(
            RateLimitState::new(config.web.reset_rate_limit, config.web.login_rate_limit)
                .with_proxy_headers(config.web.trust_proxy_headers),
        );
        let app_state = Arc::new(AppState::new(db, config, mailer)?);

        Ok(Self {
            addr,
            app_state,
            rate_limits,
        })
    }

    /// Get the server address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// The full application: pages, health check and compression.
    pub fn router(&self) -> Router {
        create_router(self.app_state.clone(), self.rate_limits.clone())
            .merge(create_health_router())
            .layer(CompressionLayer::new())
    }

    /// Start the hourly cleanup task.
    ///
    /// Removes expired sessions and forgets usernames whose failed logins
    /// have left the lockout window.
    fn start_session_cleanup_task(state: Arc<AppState>) {
        tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(Duration::from_secs(SESSION_CLEANUP_INTERVAL_SECS));

            // Skip the first immediate tick
            interval.tick().await;

            loop {
                interval.tick().await;

                match SessionRepository::new(state.db.pool()).cleanup_expired().await {
                    Ok(0) => tracing::debug!("No expired sessions to clean up"),
                    Ok(count) => {
                        tracing::info!(deleted_count = count, "Cleaned up expired sessions")
                    }
                    Err(e) => tracing::warn!(error = %e, "Failed to cleanup sessions"),
                }

                let forgotten = match state.login_limiter.lock() {
                    Ok(mut limiter) => limiter.cleanup(),
                    Err(poisoned) => poisoned.into_inner().cleanup(),
                };
                if forgotten > 0 {
                    tracing::debug!(forgotten, "Pruned login failure records");
                }
            }
        });
    }

    async fn bind(&self) -> Result<(TcpListener, SocketAddr)> {
        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;

        Self::start_session_cleanup_task(self.app_state.clone());
        self.rate_limits.clone().start_cleanup_task();
        tracing::info!("Background cleanup tasks started");

        tracing::info!("Web server listening on http://{}", local_addr);
        Ok((listener, local_addr))
    }

    /// Run the web server until it fails.
    pub async fn run(self) -> Result<()> {
        let (listener, _) = self.bind().await?;
        let router = self.router();

        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await?;
        Ok(())
    }

    /// Run the server in the background and return the actual bound address.
    ///
    /// This is useful for testing when binding to port 0.
    pub async fn run_with_addr(self) -> Result<SocketAddr> {
        let (listener, local_addr) = self.bind().await?;
        let router = self.router();

        tokio::spawn(async move {
            if let Err(e) = axum::serve(
                listener,
                router.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            {
                tracing::error!("Web server error: {}", e);
            }
        });

        Ok(local_addr)
    }
}
