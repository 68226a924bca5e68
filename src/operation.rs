//! User operation record and assembly.
//!
//! An operation is immutable once hashed: sponsorship and signing each
//! produce a new value instead of mutating in place, so the
//! hash-then-sign ordering stays auditable.

use alloy_primitives::{keccak256, Address, Bytes, U256};
use alloy_sol_types::SolCall;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::node::ChainReader;
use crate::config::NetworkConfig;
use crate::contracts::{ZKPassAccount, ZKPassAccountFactory};
use crate::encoding::canonicalize;
use crate::error::WalletError;
use crate::resolver::AccountRecord;

/// Floor gas values used when the network does not supply better estimates.
pub const CALL_GAS_FLOOR: u64 = 70_000;
pub const PRE_VERIFICATION_GAS_FLOOR: u64 = 80_000;
pub const VERIFICATION_GAS_LIMIT: u64 = 150_000;

/// ERC-4337 v0.6 user operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOperation {
    pub sender: Address,
    pub nonce: U256,
    pub init_code: Bytes,
    pub call_data: Bytes,
    pub call_gas_limit: U256,
    pub verification_gas_limit: U256,
    pub pre_verification_gas: U256,
    pub max_fee_per_gas: U256,
    pub max_priority_fee_per_gas: U256,
    pub paymaster_and_data: Bytes,
    pub signature: Bytes,
}

impl UserOperation {
    /// New value with the sponsorship payload embedded. Invalidates any
    /// hash computed over the unsponsored value.
    pub fn with_paymaster_data(mut self, data: Bytes) -> Self {
        self.paymaster_and_data = data;
        self
    }

    /// New value carrying the signature. The signature is valid only for
    /// the exact hash of the fields as they are at this point.
    pub fn with_signature(mut self, signature: Bytes) -> Self {
        self.signature = signature;
        self
    }

    /// Canonical wire form for paymaster and bundler requests.
    pub fn to_rpc_value(&self) -> Result<Value, WalletError> {
        let raw = serde_json::to_value(self)
            .map_err(|e| WalletError::Encoding(format!("serialize operation: {}", e)))?;
        canonicalize(&raw)
    }
}

/// A call intent: target contract, attached value and encoded call.
#[derive(Debug, Clone)]
pub struct CallIntent {
    pub target: Address,
    pub value: U256,
    pub call_data: Bytes,
}

/// Selector of the account's guardian setter, `addEmailGuardian(bytes32)`.
pub const ADD_GUARDIAN_SELECTOR: [u8; 4] = [0x99, 0xa4, 0x45, 0x31];

/// Self-call intent that anchors `keccak256(utf8(email))` as the
/// account's email guardian. Submitted through the normal pipeline.
pub fn guardian_intent(account: Address, email: &str) -> CallIntent {
    let email_hash = keccak256(email.as_bytes());
    let mut data = Vec::with_capacity(4 + 32);
    data.extend_from_slice(&ADD_GUARDIAN_SELECTOR);
    data.extend_from_slice(email_hash.as_slice());
    CallIntent {
        target: account,
        value: U256::ZERO,
        call_data: data.into(),
    }
}

/// Calldata for the account's `execute(dest, value, func)`.
pub fn execute_calldata(intent: &CallIntent) -> Bytes {
    ZKPassAccount::executeCall {
        dest: intent.target,
        value: intent.value,
        func: intent.call_data.clone(),
    }
    .abi_encode()
    .into()
}

/// Init-code for an undeployed account: factory address followed by the
/// `createAccount(username, commitment)` call.
pub fn creation_calldata(factory: Address, username: &str, commitment: U256) -> Bytes {
    let call = ZKPassAccountFactory::createAccountCall {
        name: username.to_string(),
        passHash: commitment,
    }
    .abi_encode();
    let mut out = Vec::with_capacity(20 + call.len());
    out.extend_from_slice(factory.as_slice());
    out.extend_from_slice(&call);
    out.into()
}

/// Builds a complete operation from a call intent plus account context,
/// filling nonce and gas/fee fields from chain state. The produced value
/// has every field populated except paymaster-and-data and signature.
pub struct OperationAssembler<'a, C: ChainReader> {
    chain: &'a C,
    config: &'a NetworkConfig,
}

impl<'a, C: ChainReader> OperationAssembler<'a, C> {
    pub fn new(chain: &'a C, config: &'a NetworkConfig) -> Self {
        Self { chain, config }
    }

    pub async fn assemble(
        &self,
        intent: &CallIntent,
        account: &AccountRecord,
    ) -> Result<UserOperation, WalletError> {
        let init_code = if account.deployed {
            Bytes::new()
        } else {
            creation_calldata(
                self.config.account_factory,
                &account.username,
                account.commitment,
            )
        };

        // Undeployed senders have no entry-point nonce yet.
        let nonce = if account.deployed {
            self.chain
                .entry_point_nonce(self.config.entry_point, account.address)
                .await
                .map_err(|e| WalletError::Assembly(e.to_string()))?
        } else {
            U256::ZERO
        };

        let gas_price = self
            .chain
            .gas_price()
            .await
            .map_err(|e| WalletError::Assembly(e.to_string()))?;
        let priority_fee = self
            .chain
            .max_priority_fee()
            .await
            .map_err(|e| WalletError::Assembly(e.to_string()))?;

        Ok(UserOperation {
            sender: account.address,
            nonce,
            init_code,
            call_data: execute_calldata(intent),
            call_gas_limit: U256::from(CALL_GAS_FLOOR),
            verification_gas_limit: U256::from(VERIFICATION_GAS_LIMIT),
            pre_verification_gas: U256::from(PRE_VERIFICATION_GAS_FLOOR),
            max_fee_per_gas: gas_price.max(priority_fee),
            max_priority_fee_per_gas: priority_fee.min(gas_price),
            paymaster_and_data: Bytes::new(),
            signature: Bytes::new(),
        })
    }
}
