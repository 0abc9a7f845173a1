//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build the process-scoped state (registry, cache, aggregator)
//! - Create the Axum router with account, admin and metrics handlers
//! - Wire up middleware (request ID, tracing, timeout, body limit)
//! - Run background upkeep and serve until shutdown

use axum::routing::get;
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::adapters::AdapterRegistry;
use crate::admin;
use crate::aggregator::Aggregator;
use crate::cache::{MemoryStore, ReadThroughCache};
use crate::config::{AdminConfig, GatewayConfig};
use crate::domain::GatewayError;
use crate::http::accounts::{get_account, get_accounts, render_metrics};
use crate::lifecycle::Shutdown;

const UPKEEP_INTERVAL: Duration = Duration::from_secs(30);

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub aggregator: Arc<Aggregator>,
    pub metrics: Option<PrometheusHandle>,
    pub admin: AdminConfig,
}

/// HTTP server for the account gateway.
pub struct GatewayServer {
    router: Router,
    state: AppState,
    store: Arc<MemoryStore>,
    config: GatewayConfig,
}

impl GatewayServer {
    /// Build every subsystem from configuration.
    pub fn new(config: GatewayConfig, metrics: Option<PrometheusHandle>) -> Result<Self, GatewayError> {
        let registry = Arc::new(AdapterRegistry::from_config(&config)?);
        let store = Arc::new(MemoryStore::new(config.cache.max_stale()));
        let cache = Arc::new(ReadThroughCache::new(store.clone(), &config.cache));
        let aggregator = Arc::new(Aggregator::new(registry, cache, &config.aggregator));

        let state = AppState {
            aggregator,
            metrics,
            admin: config.admin.clone(),
        };
        let router = Self::build_router(&config, state.clone());

        Ok(Self {
            router,
            state,
            store,
            config,
        })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        let mut router = Router::new()
            .route("/v1/accounts/{id}", get(get_account))
            .route("/v1/accounts", get(get_accounts))
            .route("/metrics", get(render_metrics));

        if config.admin.enabled {
            router = router.merge(admin::router(state.clone()));
        }

        router.with_state(state).layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(RequestBodyLimitLayer::new(config.timeouts.max_body_bytes))
                .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs))),
        )
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Serve on `listener` until `shutdown` fires, then drain in-flight requests.
    pub async fn run(self, listener: TcpListener, shutdown: Shutdown) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            backends = self.config.backends.len(),
            cache_enabled = self.config.cache.enabled,
            "HTTP server starting"
        );

        let upkeep = tokio::spawn(upkeep_loop(
            self.store.clone(),
            self.state.metrics.clone(),
            shutdown.subscribe(),
        ));

        let mut stop = shutdown.subscribe();
        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = stop.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        shutdown.trigger();
        let _ = upkeep.await;
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Periodic cache sweep and histogram upkeep.
async fn upkeep_loop(
    store: Arc<MemoryStore>,
    metrics: Option<PrometheusHandle>,
    mut stop: broadcast::Receiver<()>,
) {
    let mut ticker = tokio::time::interval(UPKEEP_INTERVAL);
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let removed = store.sweep();
                if removed > 0 {
                    tracing::debug!(removed = removed, remaining = store.len(), "Swept expired cache entries");
                }
                if let Some(handle) = &metrics {
                    handle.run_upkeep();
                }
            }
            _ = stop.recv() => break,
        }
    }
}
