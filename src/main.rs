/// Example JSON-RPC server
/// Registers `ping` and `add`, then serves until SIGINT or SIGTERM
use clap::Parser;
use jsonrpc2_server::{Config, HttpServer, JsonRpcError, JsonRpcRequest, Registry};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info};

/// Command-line overrides applied on top of the environment configuration
#[derive(Debug, Parser)]
#[command(name = "jsonrpc2-example", version, about)]
struct Cli {
    /// Address to bind (overrides SERVER_HOST)
    #[arg(long)]
    host: Option<String>,

    /// Port to bind (overrides SERVER_PORT)
    #[arg(long)]
    port: Option<u16>,
}

#[derive(Debug, Deserialize)]
struct AddParams {
    a: i64,
    b: i64,
}

fn add(request: &JsonRpcRequest) -> Result<Value, JsonRpcError> {
    let params: AddParams = request.parse_params()?;
    params
        .a
        .checked_add(params.b)
        .map(|sum| json!(sum))
        .ok_or_else(|| JsonRpcError::invalid_params().with_data("sum overflows i64"))
}

fn ping(_request: &JsonRpcRequest) -> Result<Value, JsonRpcError> {
    info!("ping received");
    Ok(json!("pong"))
}

/// Initialize logging subsystem
fn initialize_logging(default_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .init();
}

/// Load configuration, apply CLI overrides, validate
fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = Config::from_env()?;
    if let Some(host) = &cli.host {
        config.server_host = host.clone();
    }
    if let Some(port) = cli.port {
        config.server_port = port;
    }
    config.validate()?;
    Ok(config)
}

/// Build the method table served by this example
fn build_registry() -> anyhow::Result<Arc<Registry>> {
    let registry = Registry::new();
    registry.register("ping", ping)?;
    registry.register("add", add)?;
    Ok(Arc::new(registry))
}

/// Main application logic (extracted for testing)
fn run_application(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&cli)?;
    initialize_logging(&config.log_level);
    info!(
        host = %config.server_host,
        port = %config.server_port,
        "Configuration loaded"
    );

    let registry = build_registry()?;
    let server = HttpServer::new(&config, registry)?;

    match server.run() {
        Ok(()) => {
            info!("Server exited gracefully");
            Ok(())
        }
        Err(e) => {
            error!("Server error: {}", e);
            Err(e)
        }
    }
}

fn main() -> anyhow::Result<()> {
    run_application(Cli::parse())
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonrpc2_server::{Dispatcher, Id, JsonRpcResponse, Reply};

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::try_parse_from(["jsonrpc2-example", "--host", "0.0.0.0", "--port", "9000"])
            .unwrap();
        assert_eq!(cli.host.as_deref(), Some("0.0.0.0"));
        assert_eq!(cli.port, Some(9000));
    }

    #[test]
    fn test_cli_rejects_bad_port() {
        assert!(Cli::try_parse_from(["jsonrpc2-example", "--port", "http"]).is_err());
    }

    #[test]
    fn test_registry_has_example_methods() {
        let registry = build_registry().unwrap();
        assert_eq!(registry.methods(), vec!["add", "ping"]);
    }

    #[test]
    fn test_add_handler() {
        let request = JsonRpcRequest::new("add", Some(json!({"a": 2, "b": 40})), 1u64);
        assert_eq!(add(&request), Ok(json!(42)));
    }

    #[test]
    fn test_add_handler_invalid_params() {
        let request = JsonRpcRequest::new("add", Some(json!({"a": "x"})), 1u64);
        assert_eq!(add(&request).unwrap_err().code, -32602);

        let request = JsonRpcRequest::new("add", Some(json!({"a": i64::MAX, "b": 1})), 1u64);
        assert_eq!(add(&request).unwrap_err().code, -32602);
    }

    #[test]
    fn test_ping_through_dispatcher() {
        let dispatcher = Dispatcher::new(build_registry().unwrap());
        let reply = dispatcher.dispatch(br#"{"jsonrpc":"2.0","method":"ping","id":"p"}"#);
        assert_eq!(
            reply,
            Some(Reply::Single(JsonRpcResponse::success(
                Id::from("p"),
                json!("pong")
            )))
        );
    }
}
