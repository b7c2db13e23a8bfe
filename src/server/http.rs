/// HTTP server implementation with graceful shutdown
/// Clean separation of transport layer from protocol handling
use crate::server::dispatcher::Dispatcher;
use crate::server::registry::Registry;
use crate::Config;
use axum::{
    body,
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde_json::{json, Value};
use std::future::{Future, IntoFuture};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, instrument, warn};

const JSON_CONTENT_TYPE: &str = "application/json";

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    dispatcher: Dispatcher,
    max_body_bytes: usize,
}

impl AppState {
    pub fn new(registry: Arc<Registry>, max_body_bytes: usize) -> Self {
        Self {
            dispatcher: Dispatcher::new(registry),
            max_body_bytes,
        }
    }
}

/// HTTP server with graceful shutdown
pub struct HttpServer {
    router: Router,
    host: String,
    port: u16,
    shutdown_grace: Duration,
}

impl HttpServer {
    /// Create new HTTP server with timeouts, concurrency limit and CORS
    pub fn new(config: &Config, registry: Arc<Registry>) -> anyhow::Result<Self> {
        let state = AppState::new(registry, config.max_body_bytes);

        // Configure CORS from provided origins (comma-separated or "*")
        let cors = if config.cors_allow_origins.trim() == "*" {
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::POST])
                .allow_headers([header::CONTENT_TYPE])
        } else {
            let origins_vec: Vec<_> = config
                .cors_allow_origins
                .split(',')
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .map(|s| s.parse())
                .collect::<Result<Vec<HeaderValue>, _>>()
                .map_err(|e| anyhow::anyhow!("Invalid CORS origin value: {}", e))?;
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins_vec))
                .allow_methods([Method::POST])
                .allow_headers([header::CONTENT_TYPE])
        };

        let router = Router::new()
            .route("/health", get(health_check).fallback(handle_jsonrpc))
            .fallback(handle_jsonrpc)
            .layer(cors)
            .layer(ConcurrencyLimitLayer::new(config.http_max_concurrency))
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.http_timeout_seconds,
            )))
            .layer(TraceLayer::new_for_http())
            .with_state(state);

        Ok(Self {
            router,
            host: config.server_host.clone(),
            port: config.server_port,
            shutdown_grace: Duration::from_secs(config.shutdown_grace_seconds),
        })
    }

    /// The configured router, for in-process use
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Bind the configured address and serve until SIGINT or SIGTERM
    pub async fn start(&self) -> anyhow::Result<()> {
        let addr = format!("{}:{}", self.host, self.port);
        info!("Starting HTTP server on {}", addr);

        let listener = tokio::time::timeout(Duration::from_secs(5), TcpListener::bind(&addr))
            .await
            .map_err(|_| anyhow::anyhow!("Timeout waiting to bind to {}", addr))?
            .map_err(|e| anyhow::anyhow!("Failed to bind to address {}: {}", addr, e))?;

        info!("Server listening on {}", addr);

        self.serve(listener, shutdown_signal()).await
    }

    /// Bind, serve until SIGINT or SIGTERM, then tear down the runtime.
    ///
    /// Runs on a runtime owned by this call so that handlers still blocked
    /// after the drain period cannot hold up process exit.
    pub fn run(&self) -> anyhow::Result<()> {
        block_on_bounded(self.start())
    }

    /// Like [`HttpServer::run`], on an already bound listener
    pub fn run_on<F>(&self, listener: std::net::TcpListener, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        listener.set_nonblocking(true)?;
        block_on_bounded(async move {
            let listener = TcpListener::from_std(listener)?;
            self.serve(listener, shutdown).await
        })
    }

    /// Serve on an already bound listener until `shutdown` resolves.
    ///
    /// In-flight requests get `shutdown_grace` to finish; whatever is still
    /// running after that is abandoned.
    pub async fn serve<F>(&self, listener: TcpListener, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let signalled = Arc::new(Notify::new());
        let notify = Arc::clone(&signalled);

        let server = axum::serve(listener, self.router.clone())
            .with_graceful_shutdown(async move {
                shutdown.await;
                notify.notify_one();
            })
            .into_future();
        tokio::pin!(server);

        tokio::select! {
            result = &mut server => {
                result.map_err(|e| anyhow::anyhow!("Server error: {}", e))?;
            }
            _ = signalled.notified() => {
                info!(
                    grace_seconds = self.shutdown_grace.as_secs(),
                    "Draining in-flight requests"
                );
                match tokio::time::timeout(self.shutdown_grace, &mut server).await {
                    Ok(result) => result.map_err(|e| anyhow::anyhow!("Server error: {}", e))?,
                    Err(_) => warn!("Drain period elapsed, abandoning in-flight requests"),
                }
            }
        }

        info!("Server shutdown completed");
        Ok(())
    }
}

/// Drive `task` on a fresh runtime; on return, blocking-pool threads still
/// running a handler are detached instead of joined.
fn block_on_bounded<F>(task: F) -> anyhow::Result<()>
where
    F: Future<Output = anyhow::Result<()>>,
{
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build runtime: {}", e))?;
    let result = runtime.block_on(task);
    runtime.shutdown_background();
    result
}

/// JSON-RPC 2.0 endpoint
#[instrument(skip_all, fields(http_method = %request.method()))]
async fn handle_jsonrpc(State(state): State<AppState>, request: Request) -> Response {
    if request.method() != Method::POST || !is_json_content_type(request.headers()) {
        debug!("Rejected request with wrong method or content type");
        return (StatusCode::BAD_REQUEST, "invalid request").into_response();
    }

    let payload = match body::to_bytes(request.into_body(), state.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(error = %e, "Unable to read request body");
            return (StatusCode::INTERNAL_SERVER_ERROR, "unable to read body").into_response();
        }
    };

    // Handlers may block, so keep them off the async workers.
    let dispatcher = state.dispatcher.clone();
    match tokio::task::spawn_blocking(move || dispatcher.handle_payload(&payload)).await {
        Ok(Some(reply)) => (
            [(header::CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE))],
            reply,
        )
            .into_response(),
        Ok(None) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => {
            error!(error = %e, "Dispatch task failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn is_json_content_type(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        == Some(JSON_CONTENT_TYPE)
}

/// Liveness endpoint reporting the number of registered methods
async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "methods": state.dispatcher.registry().len(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// Graceful shutdown signal handler
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install signal handler");
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            info!("Received terminate signal");
        }
    }

    info!("Shutdown signal received, starting graceful shutdown");
}
