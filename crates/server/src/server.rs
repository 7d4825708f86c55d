use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::Router;
use tokio::signal;
use tower_http::{
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{info, Level};

use pixelpress_core::config::ServerConfig;
use pixelpress_core::{AppConfig, HttpFetcher, Pipeline, RemoteFetcher, SourceResolver};
use pixelpress_storage::{ContentStore, IpfsClient, LocalStore};

use crate::error::{ServerError, ServerResult};
use crate::routes::{create_router, AppState};

/// The assembled HTTP server: router, middleware, and bind address.
pub struct Server {
    router: Router,
    addr: SocketAddr,
}

impl Server {
    /// Wire the pipeline, stores, and routes from configuration. The output
    /// directory is created up front so the static file service has
    /// something to serve.
    pub async fn new(config: AppConfig) -> ServerResult<Self> {
        info!("Initializing pixelpress server...");

        let store = LocalStore::new(config.storage.output_dir.clone());
        store
            .ensure()
            .await
            .map_err(|e| ServerError::Internal(format!("Output directory unavailable: {e}")))?;

        let content_store: Option<Arc<dyn ContentStore>> = if config.content_store.enabled {
            Some(Arc::new(IpfsClient::new(config.content_store.api_url.clone())))
        } else {
            info!("Content store disabled; responses will carry a null ipfs_cid");
            None
        };

        let state = AppState {
            pipeline: Arc::new(Pipeline::new(store, content_store)),
            resolver: SourceResolver::new(config.storage.upload_dir.clone()),
            fetcher: Arc::new(HttpFetcher::new()) as Arc<dyn RemoteFetcher>,
            config: config.clone(),
        };

        let router = create_app_router(state, &config.server);

        let addr = format!("{}:{}", config.server.host, config.server.port)
            .parse()
            .map_err(|e| ServerError::Internal(format!("Invalid server address: {e}")))?;

        Ok(Self { router, addr })
    }

    /// Bind and serve until a shutdown signal arrives.
    pub async fn serve(self) -> ServerResult<()> {
        let listener = tokio::net::TcpListener::bind(self.addr)
            .await
            .map_err(|e| ServerError::Internal(format!("Failed to bind to address: {e}")))?;

        info!("Server listening on http://{}", self.addr);
        info!("Health check available at http://{}/health", self.addr);

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ServerError::Internal(format!("Server error: {e}")))?;

        info!("Server shutdown complete");
        Ok(())
    }
}

fn create_app_router(state: AppState, config: &ServerConfig) -> Router {
    let cors_layer = if config.cors_origins.contains(&"*".to_string()) {
        CorsLayer::new()
            .allow_origin(tower_http::cors::Any)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
            .max_age(Duration::from_secs(3600))
    } else {
        CorsLayer::new()
            .allow_origin(
                config
                    .cors_origins
                    .iter()
                    .filter_map(|origin| origin.parse::<HeaderValue>().ok())
                    .collect::<Vec<_>>(),
            )
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
            .max_age(Duration::from_secs(3600))
    };

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_request(DefaultOnRequest::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    // Layers are applied individually so axum normalizes the response body
    // type between them; the ordering matches the previous ServiceBuilder
    // stack (trace outermost, body limit innermost).
    create_router(state)
        .layer(RequestBodyLimitLayer::new(config.max_request_size))
        // Replace axum's own 2 MiB cap with the configured one.
        .layer(DefaultBodyLimit::disable())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.request_timeout_secs,
        )))
        .layer(cors_layer)
        .layer(trace_layer)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown...");
        },
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown...");
        },
    }
}
