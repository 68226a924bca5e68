// Generic JSON-RPC 2.0 client used by the node, paymaster, bundler and
// remote-prover endpoints.
use reqwest::Client;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::WalletError;

pub struct JsonRpcClient {
    url: String,
    client: Client,
    request_id: AtomicU64,
}

impl JsonRpcClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: Client::new(),
            request_id: AtomicU64::new(1),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn call(&self, method: &str, params: Value) -> Result<Value, WalletError> {
        let id = self.request_id.fetch_add(1, Ordering::SeqCst);
        let request = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": id,
        });
        tracing::debug!(method, id, url = %self.url, "rpc call");

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| WalletError::Rpc(format!("RPC request failed: {}", e)))?;

        let json: Value = response
            .json()
            .await
            .map_err(|e| WalletError::Rpc(format!("Failed to parse response: {}", e)))?;

        if let Some(error) = json.get("error") {
            let message = error["message"].as_str().unwrap_or("Unknown error");
            return Err(WalletError::Rpc(message.to_string()));
        }

        Ok(json["result"].clone())
    }
}
