//! Chain read access for the resolver and assembler. The [`ChainReader`]
//! trait is the seam mocked in tests; [`NodeClient`] is the JSON-RPC
//! implementation over `eth_call` and the fee/nonce query surface.

use alloy_primitives::{aliases::U192, Address, B256, U256};
use alloy_sol_types::SolCall;
use async_trait::async_trait;
use serde_json::{json, Value};

use crate::client::rpc::JsonRpcClient;
use crate::contracts::{
    IEntryPoint, INSRegistry, PublicResolver, ZKPassAccount, ZKPassAccountFactory,
};
use crate::encoding::hex_bytes;
use crate::error::WalletError;

const DEFAULT_PRIORITY_FEE: u64 = 1_000_000_000; // 1 gwei

#[async_trait]
pub trait ChainReader: Send + Sync {
    async fn chain_id(&self) -> Result<u64, WalletError>;
    async fn gas_price(&self) -> Result<U256, WalletError>;
    async fn max_priority_fee(&self) -> Result<U256, WalletError>;
    async fn balance_of(&self, address: Address) -> Result<U256, WalletError>;

    /// Registry lookup: resolver bound to a namespace hash, zero if none.
    async fn resolver_of(&self, registry: Address, node: B256) -> Result<Address, WalletError>;
    /// Resolver lookup: address bound to a namespace hash.
    async fn address_of(&self, resolver: Address, node: B256) -> Result<Address, WalletError>;
    /// Deployed account's anchored password-hash commitment.
    async fn pass_hash(&self, account: Address) -> Result<U256, WalletError>;
    /// Email guardian hash; all-zero sentinel means none configured.
    async fn email_guardian(&self, account: Address) -> Result<B256, WalletError>;
    /// Factory's deterministic deployment address for (username, commitment).
    async fn deployment_address(
        &self,
        factory: Address,
        username: &str,
        commitment: U256,
    ) -> Result<Address, WalletError>;
    /// Current entry-point nonce of a deployed sender.
    async fn entry_point_nonce(
        &self,
        entry_point: Address,
        sender: Address,
    ) -> Result<U256, WalletError>;
}

pub struct NodeClient {
    rpc: JsonRpcClient,
}

impl NodeClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            rpc: JsonRpcClient::new(endpoint),
        }
    }

    async fn eth_call(&self, to: Address, data: Vec<u8>) -> Result<Vec<u8>, WalletError> {
        let params = json!([{"to": to.to_string(), "data": hex_bytes(&data)}, "latest"]);
        let result = self.rpc.call("eth_call", params).await?;
        let s = result
            .as_str()
            .ok_or_else(|| WalletError::Rpc("eth_call returned non-string".to_string()))?;
        hex::decode(s.trim_start_matches("0x"))
            .map_err(|e| WalletError::Rpc(format!("bad eth_call output: {}", e)))
    }

    async fn view<C: SolCall>(&self, to: Address, call: C) -> Result<C::Return, WalletError> {
        let out = self.eth_call(to, call.abi_encode()).await?;
        C::abi_decode_returns(&out).map_err(|e| WalletError::Rpc(format!("abi decode failed: {}", e)))
    }

    async fn quantity(&self, method: &str, params: Value) -> Result<U256, WalletError> {
        let result = self.rpc.call(method, params).await?;
        parse_quantity(&result)
    }
}

fn parse_quantity(value: &Value) -> Result<U256, WalletError> {
    let s = value
        .as_str()
        .ok_or_else(|| WalletError::Rpc(format!("expected quantity, got {}", value)))?;
    U256::from_str_radix(s.trim_start_matches("0x"), 16)
        .map_err(|e| WalletError::Rpc(format!("bad quantity {:?}: {}", s, e)))
}

#[async_trait]
impl ChainReader for NodeClient {
    async fn chain_id(&self) -> Result<u64, WalletError> {
        let id = self.quantity("eth_chainId", json!([])).await?;
        id.try_into()
            .map_err(|_| WalletError::Rpc("chain id overflow".to_string()))
    }

    async fn gas_price(&self) -> Result<U256, WalletError> {
        self.quantity("eth_gasPrice", json!([])).await
    }

    async fn max_priority_fee(&self) -> Result<U256, WalletError> {
        // Not every chain exposes this; fall back to a fixed floor.
        match self.quantity("eth_maxPriorityFeePerGas", json!([])).await {
            Ok(fee) => Ok(fee),
            Err(_) => Ok(U256::from(DEFAULT_PRIORITY_FEE)),
        }
    }

    async fn balance_of(&self, address: Address) -> Result<U256, WalletError> {
        self.quantity("eth_getBalance", json!([address.to_string(), "latest"]))
            .await
    }

    async fn resolver_of(&self, registry: Address, node: B256) -> Result<Address, WalletError> {
        self.view(registry, INSRegistry::resolverCall { node }).await
    }

    async fn address_of(&self, resolver: Address, node: B256) -> Result<Address, WalletError> {
        self.view(resolver, PublicResolver::addrCall { node }).await
    }

    async fn pass_hash(&self, account: Address) -> Result<U256, WalletError> {
        self.view(account, ZKPassAccount::passHashCall {}).await
    }

    async fn email_guardian(&self, account: Address) -> Result<B256, WalletError> {
        self.view(account, ZKPassAccount::emailCall {}).await
    }

    async fn deployment_address(
        &self,
        factory: Address,
        username: &str,
        commitment: U256,
    ) -> Result<Address, WalletError> {
        self.view(
            factory,
            ZKPassAccountFactory::getAddressCall {
                name: username.to_string(),
                passHash: commitment,
            },
        )
        .await
    }

    async fn entry_point_nonce(
        &self,
        entry_point: Address,
        sender: Address,
    ) -> Result<U256, WalletError> {
        self.view(
            entry_point,
            IEntryPoint::getNonceCall {
                sender,
                key: U192::ZERO,
            },
        )
        .await
    }
}
