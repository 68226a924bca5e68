//! Bundler relay. Accepts the canonicalized fully-signed operation plus the
//! entry-point address and returns an operation-hash identifier.

use alloy_primitives::Address;
use async_trait::async_trait;
use serde_json::{json, Value};

use crate::client::rpc::JsonRpcClient;
use crate::error::WalletError;

#[async_trait]
pub trait Relay: Send + Sync {
    async fn send_user_operation(
        &self,
        operation: &Value,
        entry_point: Address,
    ) -> Result<String, WalletError>;
}

pub struct BundlerClient {
    rpc: JsonRpcClient,
}

impl BundlerClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            rpc: JsonRpcClient::new(endpoint),
        }
    }
}

#[async_trait]
impl Relay for BundlerClient {
    async fn send_user_operation(
        &self,
        operation: &Value,
        entry_point: Address,
    ) -> Result<String, WalletError> {
        let result = self
            .rpc
            .call(
                "eth_sendUserOperation",
                json!([operation, entry_point.to_string()]),
            )
            .await
            .map_err(|e| WalletError::Submission(e.to_string()))?;
        result
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| WalletError::Submission("non-string operation hash".to_string()))
    }
}
