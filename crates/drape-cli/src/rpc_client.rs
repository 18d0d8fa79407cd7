// crates/drape-cli/src/rpc_client.rs
//
// Lightweight JSON-RPC client that POSTs envelopes to the drape-daemon.

use serde::de::DeserializeOwned;

use drape_rpc::server::CALL_PATH;
use drape_rpc::{JsonRpcRequest, JsonRpcResponse};

/// Full URL of the call path under `endpoint`.
pub fn call_url(endpoint: &str) -> String {
    format!("{}{}", endpoint.trim_end_matches('/'), CALL_PATH)
}

/// Send a JSON-RPC call to the daemon and return the parsed envelope.
pub async fn rpc_call(
    endpoint: &str,
    method: &str,
    params: serde_json::Value,
) -> Result<JsonRpcResponse, Box<dyn std::error::Error>> {
    let request = JsonRpcRequest::new(method, params);

    let client = reqwest::Client::new();
    let resp = client.post(call_url(endpoint)).json(&request).send().await?;

    let rpc_response: JsonRpcResponse = resp.json().await?;
    Ok(rpc_response)
}

/// Call `method` and decode its result, turning a failed envelope into an
/// error.
pub async fn call<T: DeserializeOwned>(
    endpoint: &str,
    method: &str,
    params: serde_json::Value,
) -> Result<T, Box<dyn std::error::Error>> {
    let response = rpc_call(endpoint, method, params).await?;
    if !response.success {
        let reason = response.error.unwrap_or_else(|| "unknown error".to_string());
        return Err(format!("{} failed: {}", method, reason).into());
    }
    let result = response
        .result
        .ok_or_else(|| format!("{} returned no result", method))?;
    Ok(serde_json::from_value(result)?)
}
