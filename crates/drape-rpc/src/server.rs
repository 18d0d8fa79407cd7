// crates/drape-rpc/src/server.rs
//
// RPC server setup: DrapeRpcServer, RpcConfig, and the JSON-RPC envelope.
//
// A single tonic service accepts JSON-encoded requests with a method field,
// dispatches to the matching handler, and returns JSON-encoded responses.
// HTTP/1 is accepted so plain JSON clients can call it.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use http_body::Body as HttpBody;
use http_body_util::BodyExt;
use serde::{Deserialize, Serialize};
use tonic::transport::Server;
use tonic::Status;

use drape_rank::Recommender;

use crate::handlers;
use crate::middleware;

/// Fully qualified service name used for routing.
pub const SERVICE_NAME: &str = "drape.rpc.DrapeService";

/// Path clients POST envelopes to.
pub const CALL_PATH: &str = "/drape.rpc.DrapeService/Call";

// ---------------------------------------------------------------------------
// RpcConfig
// ---------------------------------------------------------------------------

/// Configuration for the RPC server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcConfig {
    /// Host to bind to (e.g., "127.0.0.1" or "0.0.0.0").
    pub host: String,
    /// Port to listen on.
    pub port: u16,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 50051,
        }
    }
}

// ---------------------------------------------------------------------------
// JSON-RPC Envelope
// ---------------------------------------------------------------------------

/// A JSON-RPC-style request envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    /// The RPC method to invoke (e.g., "recommend/rank", "events/record").
    pub method: String,
    /// JSON-encoded parameters for the method.
    #[serde(default)]
    pub params: serde_json::Value,
}

impl JsonRpcRequest {
    pub fn new(method: impl Into<String>, params: serde_json::Value) -> Self {
        Self {
            method: method.into(),
            params,
        }
    }
}

/// A JSON-RPC-style response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// Whether the request succeeded.
    pub success: bool,
    /// The result data (if success).
    pub result: Option<serde_json::Value>,
    /// Error message (if not success).
    pub error: Option<String>,
}

impl JsonRpcResponse {
    fn ok(value: serde_json::Value) -> Self {
        Self {
            success: true,
            result: Some(value),
            error: None,
        }
    }

    fn err(message: String) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(message),
        }
    }
}

// ---------------------------------------------------------------------------
// DrapeRpcServer
// ---------------------------------------------------------------------------

/// The RPC server for the Drape recommender.
#[derive(Clone)]
pub struct DrapeRpcServer {
    config: RpcConfig,
    recommender: Arc<Recommender>,
    /// Daemon start time for uptime calculation.
    start_time: Option<Instant>,
}

impl std::fmt::Debug for DrapeRpcServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DrapeRpcServer")
            .field("config", &self.config)
            .field("rank", self.recommender.config())
            .finish()
    }
}

impl DrapeRpcServer {
    pub fn new(config: RpcConfig, recommender: Arc<Recommender>) -> Self {
        Self {
            config,
            recommender,
            start_time: None,
        }
    }

    /// Set the daemon start time for uptime calculation.
    pub fn with_start_time(mut self, start_time: Instant) -> Self {
        self.start_time = Some(start_time);
        self
    }

    pub fn config(&self) -> &RpcConfig {
        &self.config
    }

    /// Dispatch one envelope in-process, without the transport.
    pub async fn handle(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        self.service().dispatch(request).await
    }

    /// Serve until the process is terminated.
    pub async fn start(&self) -> Result<(), Box<dyn std::error::Error>> {
        self.start_with_shutdown(std::future::pending()).await
    }

    /// Serve until `signal` resolves, then drain in-flight requests.
    pub async fn start_with_shutdown<F>(&self, signal: F) -> Result<(), Box<dyn std::error::Error>>
    where
        F: Future<Output = ()> + Send,
    {
        let addr = format!("{}:{}", self.config.host, self.config.port).parse()?;

        tracing::info!(%addr, path = CALL_PATH, "Drape RPC server starting");

        Server::builder()
            .accept_http1(true)
            .add_service(tonic::service::interceptor::InterceptedService::new(
                DrapeJsonRpcServer::new(self.service()),
                middleware::logging_interceptor,
            ))
            .serve_with_shutdown(addr, signal)
            .await?;

        tracing::info!("Drape RPC server stopped");
        Ok(())
    }

    fn service(&self) -> DrapeServiceImpl {
        DrapeServiceImpl {
            recommender: self.recommender.clone(),
            start_time: self.start_time,
        }
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Holds shared state and dispatches JSON-RPC calls to handlers.
#[derive(Clone)]
struct DrapeServiceImpl {
    recommender: Arc<Recommender>,
    start_time: Option<Instant>,
}

impl DrapeServiceImpl {
    async fn dispatch(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        let recommender = self.recommender.as_ref();
        let result = match request.method.as_str() {
            "catalog/list" => {
                dispatch_handler(request.params, |r| {
                    handlers::catalog::handle_list_catalog(recommender, r)
                })
                .await
            }
            "recommend/rank" => {
                dispatch_handler(request.params, |r| handlers::recommend::handle_rank(recommender, r)).await
            }
            "events/record" => {
                dispatch_handler(request.params, |r| {
                    handlers::events::handle_record_event(recommender, r)
                })
                .await
            }
            "events/list" => {
                dispatch_handler(request.params, |r| {
                    handlers::events::handle_list_events(recommender, r)
                })
                .await
            }
            "events/clear" => {
                dispatch_handler(request.params, |r| {
                    handlers::events::handle_clear_events(recommender, r)
                })
                .await
            }
            "mask/get" => {
                dispatch_handler(request.params, |r| handlers::mask::handle_get_mask(recommender, r)).await
            }
            "node/health" => {
                let start_time = self.start_time;
                dispatch_handler(request.params, |r| {
                    handlers::node::handle_get_health(recommender, r, start_time)
                })
                .await
            }
            _ => Err(format!("Unknown method: {}", request.method)),
        };

        match result {
            Ok(value) => JsonRpcResponse::ok(value),
            Err(err) => {
                tracing::warn!(method = %request.method, error = %err, "RPC call failed");
                JsonRpcResponse::err(err)
            }
        }
    }
}

/// Deserialize params into a request type, call the handler, and serialize
/// the result. Absent params are read as an empty object.
async fn dispatch_handler<Req, Resp, F, Fut>(params: serde_json::Value, handler: F) -> Result<serde_json::Value, String>
where
    Req: serde::de::DeserializeOwned,
    Resp: serde::Serialize,
    F: FnOnce(Req) -> Fut,
    Fut: Future<Output = Result<Resp, String>>,
{
    let params = if params.is_null() {
        serde_json::Value::Object(serde_json::Map::new())
    } else {
        params
    };
    let request: Req =
        serde_json::from_value(params).map_err(|e| format!("Failed to deserialize request: {}", e))?;
    let response = handler(request).await?;
    serde_json::to_value(response).map_err(|e| format!("Failed to serialize response: {}", e))
}

// ---------------------------------------------------------------------------
// Tonic Service Wiring
// ---------------------------------------------------------------------------
// One service, one method. Request and response bodies are raw JSON bytes.

/// Low-level tonic service: reads the body, decodes the envelope, and
/// dispatches.
#[derive(Clone)]
pub struct DrapeJsonRpcServer {
    inner: DrapeServiceImpl,
}

impl std::fmt::Debug for DrapeJsonRpcServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DrapeJsonRpcServer").finish()
    }
}

impl DrapeJsonRpcServer {
    fn new(inner: DrapeServiceImpl) -> Self {
        Self { inner }
    }
}

impl tonic::server::NamedService for DrapeJsonRpcServer {
    const NAME: &'static str = SERVICE_NAME;
}

impl<B> tower_service::Service<http::Request<B>> for DrapeJsonRpcServer
where
    B: HttpBody + Send + 'static,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>> + Send,
    B::Data: Send,
{
    type Response = http::Response<tonic::body::BoxBody>;
    type Error = std::convert::Infallible;
    type Future = std::pin::Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut std::task::Context<'_>) -> std::task::Poll<Result<(), Self::Error>> {
        std::task::Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: http::Request<B>) -> Self::Future {
        let inner = self.inner.clone();

        Box::pin(async move {
            let body_bytes = match collect_body(req.into_body()).await {
                Ok(b) => b,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to read request body");
                    let resp = JsonRpcResponse::err(format!("Failed to read request body: {}", e));
                    return Ok(build_response(encode(&resp)));
                }
            };

            let rpc_request: JsonRpcRequest = match serde_json::from_slice(&body_bytes) {
                Ok(r) => r,
                Err(e) => {
                    let resp = JsonRpcResponse::err(format!("Invalid JSON-RPC request: {}", e));
                    return Ok(build_response(encode(&resp)));
                }
            };

            let rpc_response = inner.dispatch(rpc_request).await;
            Ok(build_response(encode(&rpc_response)))
        })
    }
}

fn encode(response: &JsonRpcResponse) -> Vec<u8> {
    serde_json::to_vec(response).unwrap_or_default()
}

/// Collect the body of an HTTP request into bytes.
async fn collect_body<B>(body: B) -> Result<Vec<u8>, String>
where
    B: HttpBody + Send,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    B::Data: Send,
{
    let mut collected = Vec::new();
    let mut body = std::pin::pin!(body);

    loop {
        match std::future::poll_fn(|cx| HttpBody::poll_frame(body.as_mut(), cx)).await {
            Some(Ok(frame)) => {
                if let Ok(mut data) = frame.into_data() {
                    use bytes::Buf;
                    while data.has_remaining() {
                        let chunk = data.chunk();
                        collected.extend_from_slice(chunk);
                        let len = chunk.len();
                        data.advance(len);
                    }
                }
            }
            Some(Err(e)) => return Err(e.into().to_string()),
            None => break,
        }
    }

    Ok(collected)
}

/// Build a 200 response with the given JSON body.
fn build_response(json: Vec<u8>) -> http::Response<tonic::body::BoxBody> {
    let body = tonic::body::BoxBody::new(
        http_body_util::Full::new(bytes::Bytes::from(json))
            .map_err(|e| Status::internal(format!("body error: {}", e))),
    );

    let mut response = http::Response::new(body);
    response.headers_mut().insert(
        http::header::CONTENT_TYPE,
        http::HeaderValue::from_static("application/json"),
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support;
    use serde_json::json;
    use tower_service::Service;

    fn server() -> DrapeRpcServer {
        DrapeRpcServer::new(RpcConfig::default(), Arc::new(test_support::recommender()))
            .with_start_time(Instant::now())
    }

    #[tokio::test]
    async fn dispatches_known_methods() {
        let server = server();

        let resp = server
            .handle(JsonRpcRequest::new("events/record", json!({"productId": "a2", "action": "like"})))
            .await;
        assert!(resp.success, "{:?}", resp.error);

        let resp = server
            .handle(JsonRpcRequest::new("recommend/rank", json!({"limit": 2})))
            .await;
        assert!(resp.success);
        let result = resp.result.unwrap();
        assert_eq!(result["count"], 2);
        assert_eq!(result["recommendations"][0]["id"], "a2");

        let resp = server.handle(JsonRpcRequest::new("node/health", json!(null))).await;
        assert!(resp.success);
        assert_eq!(resp.result.unwrap()["eventCount"], 1);
    }

    #[tokio::test]
    async fn unknown_method_and_bad_params_fail_in_envelope() {
        let server = server();

        let resp = server.handle(JsonRpcRequest::new("node/shutdown", json!({}))).await;
        assert!(!resp.success);
        assert_eq!(resp.error.as_deref(), Some("Unknown method: node/shutdown"));

        let resp = server
            .handle(JsonRpcRequest::new("recommend/rank", json!({"limit": "six"})))
            .await;
        assert!(!resp.success);
        assert!(resp.error.unwrap().starts_with("Failed to deserialize request"));

        let resp = server
            .handle(JsonRpcRequest::new("events/record", json!({"action": "like"})))
            .await;
        assert!(!resp.success);
    }

    #[tokio::test]
    async fn http_service_round_trips_json() {
        let mut svc = DrapeJsonRpcServer::new(server().service());
        let body = serde_json::to_vec(&JsonRpcRequest::new("catalog/list", json!({"category": "eyewear"}))).unwrap();
        let req = http::Request::post(CALL_PATH)
            .body(http_body_util::Full::new(bytes::Bytes::from(body)))
            .unwrap();

        let resp = svc.call(req).await.unwrap();
        assert_eq!(resp.status(), http::StatusCode::OK);
        assert_eq!(resp.headers()[http::header::CONTENT_TYPE], "application/json");

        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let envelope: JsonRpcResponse = serde_json::from_slice(&bytes).unwrap();
        assert!(envelope.success);
        assert_eq!(envelope.result.unwrap()["products"][0]["id"], "e1");
    }

    #[tokio::test]
    async fn http_service_rejects_malformed_envelopes() {
        let mut svc = DrapeJsonRpcServer::new(server().service());
        let req = http::Request::post(CALL_PATH)
            .body(http_body_util::Full::new(bytes::Bytes::from_static(b"not json")))
            .unwrap();

        let resp = svc.call(req).await.unwrap();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let envelope: JsonRpcResponse = serde_json::from_slice(&bytes).unwrap();
        assert!(!envelope.success);
        assert!(envelope.error.unwrap().starts_with("Invalid JSON-RPC request"));
    }
}
