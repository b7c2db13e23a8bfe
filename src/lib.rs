/// JSON-RPC 2.0 server library
/// Method registry, dispatcher and HTTP transport
pub mod server;
pub mod types;
pub mod validation;

// Re-export key types for public API
pub use server::dispatcher::{Dispatcher, Reply};
pub use server::http::{AppState, HttpServer};
pub use server::jsonrpc::{ErrorCode, JsonRpcError, JsonRpcRequest, JsonRpcResponse};
pub use server::registry::{Handler, Registry, RegistryError};
pub use types::{Id, VERSION};
pub use validation::ValidationError;

const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;
const MAX_BODY_BYTES_CEILING: usize = 64 * 1024 * 1024;

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub log_level: String,
    // HTTP transport limits
    pub http_timeout_seconds: u64,
    pub http_max_concurrency: usize,
    pub max_body_bytes: usize,
    pub cors_allow_origins: String,
    // Drain period after a shutdown signal
    pub shutdown_grace_seconds: u64,
}

impl Config {
    /// Create a new Config instance with default limits
    pub fn new(server_host: String, server_port: u16, log_level: String) -> Self {
        Self {
            server_host,
            server_port,
            log_level,
            http_timeout_seconds: 15,
            http_max_concurrency: 100,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            cors_allow_origins: "*".to_string(),
            shutdown_grace_seconds: 5,
        }
    }

    /// Create configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let server_host = std::env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let server_port = std::env::var("SERVER_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid SERVER_PORT value"))?;

        let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let http_timeout_seconds = std::env::var("HTTP_TIMEOUT_SECONDS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(15);

        let http_max_concurrency = std::env::var("HTTP_MAX_CONCURRENCY")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(100);

        let max_body_bytes = std::env::var("MAX_BODY_BYTES")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(DEFAULT_MAX_BODY_BYTES);

        let cors_allow_origins =
            std::env::var("CORS_ALLOW_ORIGINS").unwrap_or_else(|_| "*".to_string());

        let shutdown_grace_seconds = std::env::var("SHUTDOWN_GRACE_SECONDS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(5);

        Ok(Self {
            server_host,
            server_port,
            log_level,
            http_timeout_seconds,
            http_max_concurrency,
            max_body_bytes,
            cors_allow_origins,
            shutdown_grace_seconds,
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server_host.trim().is_empty() {
            return Err(anyhow::anyhow!("Server host cannot be empty"));
        }

        if self.server_port == 0 {
            return Err(anyhow::anyhow!("Server port must be greater than 0"));
        }

        // HTTP configs
        if self.http_timeout_seconds == 0 || self.http_timeout_seconds > 300 {
            return Err(anyhow::anyhow!(
                "HTTP timeout must be between 1 and 300 seconds"
            ));
        }
        if self.http_max_concurrency == 0 || self.http_max_concurrency > 10_000 {
            return Err(anyhow::anyhow!(
                "HTTP max concurrency must be between 1 and 10000"
            ));
        }
        if self.max_body_bytes == 0 || self.max_body_bytes > MAX_BODY_BYTES_CEILING {
            return Err(anyhow::anyhow!(
                "MAX_BODY_BYTES must be between 1 and {}",
                MAX_BODY_BYTES_CEILING
            ));
        }

        // CORS origins basic validation (non-empty)
        if self.cors_allow_origins.trim().is_empty() {
            return Err(anyhow::anyhow!(
                "CORS_ALLOW_ORIGINS cannot be empty (use * or CSV list)"
            ));
        }

        if self.shutdown_grace_seconds == 0 || self.shutdown_grace_seconds > 300 {
            return Err(anyhow::anyhow!(
                "SHUTDOWN_GRACE_SECONDS must be between 1 and 300"
            ));
        }

        Ok(())
    }
}
