/// Common utilities for integration tests
use jsonrpc2_server::{Config, HttpServer, JsonRpcError, JsonRpcRequest, Registry};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Test configuration for integration tests
pub fn test_config() -> Config {
    Config::new("127.0.0.1".to_string(), 8080, "info".to_string())
}

#[derive(Deserialize)]
struct AddParams {
    a: i64,
    b: i64,
}

/// Registry with `add`, `ping` and a `count` method that records notifications
pub fn test_registry(counter: Arc<AtomicUsize>) -> Arc<Registry> {
    let registry = Registry::new();
    registry
        .register("add", |request: &JsonRpcRequest| -> Result<Value, JsonRpcError> {
            let params: AddParams = request.parse_params()?;
            Ok(json!(params.a + params.b))
        })
        .expect("register add");
    registry
        .register("ping", |_: &JsonRpcRequest| -> Result<Value, JsonRpcError> {
            Ok(json!("pong"))
        })
        .expect("register ping");
    registry
        .register("count", move |_: &JsonRpcRequest| -> Result<Value, JsonRpcError> {
            Ok(json!(counter.fetch_add(1, Ordering::SeqCst) + 1))
        })
        .expect("register count");
    Arc::new(registry)
}

/// A server running on an ephemeral port
pub struct TestServer {
    pub port: u16,
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<anyhow::Result<()>>,
}

impl TestServer {
    pub async fn start(registry: Arc<Registry>) -> anyhow::Result<Self> {
        let server = HttpServer::new(&test_config(), registry)?;
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let port = listener.local_addr()?.port();
        let (tx, rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            server
                .serve(listener, async move {
                    rx.await.ok();
                })
                .await
        });

        Ok(Self {
            port,
            shutdown: Some(tx),
            handle,
        })
    }

    pub async fn stop(mut self) -> anyhow::Result<()> {
        if let Some(tx) = self.shutdown.take() {
            tx.send(()).ok();
        }
        self.handle.await?
    }
}

/// Test HTTP client for making requests
pub struct TestClient {
    pub base_url: String,
    pub client: reqwest::Client,
}

impl TestClient {
    pub fn new(port: u16) -> Self {
        Self {
            base_url: format!("http://127.0.0.1:{}", port),
            client: reqwest::Client::new(),
        }
    }

    pub async fn post_raw(&self, body: impl Into<String>) -> anyhow::Result<reqwest::Response> {
        Ok(self
            .client
            .post(&self.base_url)
            .header("Content-Type", "application/json")
            .body(body.into())
            .send()
            .await?)
    }

    pub async fn post_json(&self, body: Value) -> anyhow::Result<Value> {
        let response = self.post_raw(body.to_string()).await?;
        let text = response.text().await?;
        let json: Value = serde_json::from_str(&text)?;
        Ok(json)
    }
}
