//! Operation hashing and zero-knowledge signing.
//!
//! The hash binds every operation field except the signature to the
//! entry-point address and chain id (ERC-4337 v0.6 scheme); the signature
//! embeds a proof bound to that exact hash. Any later field mutation
//! requires a re-sign.

use alloy_primitives::{keccak256, Address, B256, U256};
use alloy_sol_types::SolValue;

use crate::credential::derive_passport;
use crate::error::WalletError;
use crate::operation::UserOperation;
use crate::prover::{PasswordProver, ProofBundle, SimulatedProver};

mod hash_types {
    use alloy_sol_types::sol;

    sol! {
        struct UserOperationPackedForHash {
            address sender;
            uint256 nonce;
            bytes32 hashInitCode;
            bytes32 hashCallData;
            uint256 callGasLimit;
            uint256 verificationGasLimit;
            uint256 preVerificationGas;
            uint256 maxFeePerGas;
            uint256 maxPriorityFeePerGas;
            bytes32 hashPaymasterAndData;
        }

        struct UserOperationHashEncoded {
            bytes32 encodedHash;
            address entryPoint;
            uint256 chainId;
        }
    }
}

/// Domain-bound hash of an operation: keccak over the abi-encoded packed
/// fields, then keccak over (packed hash, entry point, chain id).
/// Independent of signature content.
pub fn operation_hash(op: &UserOperation, entry_point: Address, chain_id: u64) -> B256 {
    use hash_types::*;

    let packed = UserOperationPackedForHash {
        sender: op.sender,
        nonce: op.nonce,
        hashInitCode: keccak256(&op.init_code),
        hashCallData: keccak256(&op.call_data),
        callGasLimit: op.call_gas_limit,
        verificationGasLimit: op.verification_gas_limit,
        preVerificationGas: op.pre_verification_gas,
        maxFeePerGas: op.max_fee_per_gas,
        maxPriorityFeePerGas: op.max_priority_fee_per_gas,
        hashPaymasterAndData: keccak256(&op.paymaster_and_data),
    };
    let hashed = keccak256(packed.abi_encode());

    let encoded = UserOperationHashEncoded {
        encodedHash: hashed,
        entryPoint: entry_point,
        chainId: U256::from(chain_id),
    };
    keccak256(encoded.abi_encode())
}

/// Check an operation's embedded signature: recompute the domain-bound
/// hash, parse the proof bundle out of the signature and verify it
/// against the expected commitment and the hash. Simulated-backend
/// semantics; real proof verification happens on-chain.
pub fn verify_signature(
    op: &UserOperation,
    entry_point: Address,
    chain_id: u64,
    expected_commitment: U256,
) -> bool {
    let bundle = match ProofBundle::from_signature(&op.signature) {
        Ok(bundle) => bundle,
        Err(_) => return false,
    };
    if bundle.commitment() != Some(expected_commitment) {
        return false;
    }
    let binding = U256::from_be_bytes(operation_hash(op, entry_point, chain_id).0);
    SimulatedProver::verify(&bundle, op.nonce, binding)
}

/// One-shot signer seeded with (namespace hash, password, nonce). A fresh
/// signer is constructed per attempt; the proof-freshness nonce is the
/// operation's nonce.
pub struct ZkSigner<'a, P: PasswordProver> {
    secret: U256,
    nonce: U256,
    prover: &'a P,
}

impl<'a, P: PasswordProver> ZkSigner<'a, P> {
    pub fn new(node: B256, password: &str, nonce: U256, prover: &'a P) -> Self {
        Self {
            secret: derive_passport(node, password),
            nonce,
            prover,
        }
    }

    /// Signer constructed from an already-derived secret, so the password
    /// does not have to be retained after login.
    pub fn from_secret(secret: U256, nonce: U256, prover: &'a P) -> Self {
        Self {
            secret,
            nonce,
            prover,
        }
    }

    /// Compute the binding hash, prove authorization and return a new
    /// operation value carrying the serialized proof as its signature.
    pub async fn sign_operation(
        &self,
        op: UserOperation,
        entry_point: Address,
        chain_id: u64,
    ) -> Result<UserOperation, WalletError> {
        let hash = operation_hash(&op, entry_point, chain_id);
        let binding = U256::from_be_bytes(hash.0);
        tracing::debug!(%hash, chain_id, "signing operation");
        let bundle = self
            .prover
            .generate_proof(self.nonce, binding, self.secret)
            .await
            .map_err(|e| WalletError::Signing(e.to_string()))?;
        Ok(op.with_signature(bundle.to_signature()))
    }
}
