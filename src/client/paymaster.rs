//! Paymaster sponsorship. The request carries the canonicalized unsigned
//! operation (paymaster-and-data empty); the response is an opaque payload
//! assigned verbatim into `paymasterAndData`.

use alloy_primitives::Bytes;
use async_trait::async_trait;
use serde_json::{json, Value};

use crate::client::rpc::JsonRpcClient;
use crate::error::WalletError;

#[async_trait]
pub trait Sponsor: Send + Sync {
    async fn sponsor(&self, operation: &Value) -> Result<Bytes, WalletError>;
}

pub struct PaymasterClient {
    rpc: JsonRpcClient,
}

impl PaymasterClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            rpc: JsonRpcClient::new(endpoint),
        }
    }
}

#[async_trait]
impl Sponsor for PaymasterClient {
    async fn sponsor(&self, operation: &Value) -> Result<Bytes, WalletError> {
        let result = self
            .rpc
            .call("eth_signVerifyingPaymaster", json!([operation]))
            .await
            .map_err(|e| WalletError::Sponsorship(e.to_string()))?;
        let payload = result
            .as_str()
            .ok_or_else(|| WalletError::Sponsorship("non-string paymaster payload".to_string()))?;
        let bytes = hex::decode(payload.trim_start_matches("0x"))
            .map_err(|e| WalletError::Sponsorship(format!("bad paymaster payload: {}", e)))?;
        Ok(bytes.into())
    }
}
