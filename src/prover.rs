//! Pluggable proving capability. The core depends only on the
//! [`PasswordProver`] trait, never on a specific circuit runtime.
//!
//! Backends: a remote prover sidecar speaking JSON-RPC (the circuit
//! artifacts live there), and a deterministic simulated backend for
//! development and tests. Proof generation dominates the latency of the
//! whole flow, so backends run the work off the interaction thread.

use alloy_primitives::{Bytes, U256};
use async_trait::async_trait;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};

use crate::client::rpc::JsonRpcClient;
use crate::encoding::hex_uint;
use crate::error::WalletError;

/// Output of one proving run. `public_signals[0]` is, by convention, the
/// password-hash commitment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofBundle {
    pub public_signals: Vec<U256>,
    pub proof: Bytes,
}

impl ProofBundle {
    pub fn commitment(&self) -> Option<U256> {
        self.public_signals.first().copied()
    }

    /// Serialize into an operation signature: a 32-byte signal count word,
    /// each public signal as a 32-byte word, then the opaque proof bytes.
    pub fn to_signature(&self) -> Bytes {
        let mut out = Vec::with_capacity(32 * (1 + self.public_signals.len()) + self.proof.len());
        out.extend_from_slice(&U256::from(self.public_signals.len()).to_be_bytes::<32>());
        for signal in &self.public_signals {
            out.extend_from_slice(&signal.to_be_bytes::<32>());
        }
        out.extend_from_slice(&self.proof);
        out.into()
    }

    pub fn from_signature(data: &[u8]) -> Result<Self, WalletError> {
        if data.len() < 32 {
            return Err(WalletError::Encoding("signature too short".to_string()));
        }
        let count: usize = U256::from_be_slice(&data[..32])
            .try_into()
            .map_err(|_| WalletError::Encoding("signal count overflow".to_string()))?;
        let signals_end = count
            .checked_mul(32)
            .and_then(|n| n.checked_add(32))
            .filter(|end| *end <= data.len())
            .ok_or_else(|| WalletError::Encoding("signature truncated".to_string()))?;
        let mut public_signals = Vec::with_capacity(count);
        for i in 0..count {
            let start = 32 + i * 32;
            public_signals.push(U256::from_be_slice(&data[start..start + 32]));
        }
        Ok(Self {
            public_signals,
            proof: Bytes::copy_from_slice(&data[signals_end..]),
        })
    }
}

/// Narrow proving interface. `binding_hash` is zero when proving bare
/// knowledge of the password (login, recovery) and the operation hash when
/// authorizing a specific operation.
#[async_trait]
pub trait PasswordProver: Send + Sync {
    async fn generate_proof(
        &self,
        nonce: U256,
        binding_hash: U256,
        secret: U256,
    ) -> Result<ProofBundle, WalletError>;
}

#[async_trait]
impl PasswordProver for Box<dyn PasswordProver> {
    async fn generate_proof(
        &self,
        nonce: U256,
        binding_hash: U256,
        secret: U256,
    ) -> Result<ProofBundle, WalletError> {
        (**self).generate_proof(nonce, binding_hash, secret).await
    }
}

/// Prover sidecar reached over JSON-RPC. The sidecar holds the circuit
/// artifacts (wasm witness generator + proving key) and must be trusted
/// with the witness, so it is expected to run locally.
pub struct RemoteProver {
    rpc: JsonRpcClient,
    wasm: String,
    zkey: String,
}

impl RemoteProver {
    pub fn new(endpoint: impl Into<String>, wasm: impl Into<String>, zkey: impl Into<String>) -> Self {
        Self {
            rpc: JsonRpcClient::new(endpoint.into()),
            wasm: wasm.into(),
            zkey: zkey.into(),
        }
    }

    fn parse_signal(value: &Value) -> Result<U256, WalletError> {
        let s = value
            .as_str()
            .ok_or_else(|| WalletError::ProofGeneration("non-string public signal".to_string()))?;
        let parsed = if let Some(hex_digits) = s.strip_prefix("0x") {
            U256::from_str_radix(hex_digits, 16)
        } else {
            U256::from_str_radix(s, 10)
        };
        parsed.map_err(|e| WalletError::ProofGeneration(format!("bad public signal {:?}: {}", s, e)))
    }
}

#[async_trait]
impl PasswordProver for RemoteProver {
    async fn generate_proof(
        &self,
        nonce: U256,
        binding_hash: U256,
        secret: U256,
    ) -> Result<ProofBundle, WalletError> {
        let params = json!([{
            "nonce": hex_uint(nonce),
            "opHash": hex_uint(binding_hash),
            "passport": hex_uint(secret),
            "wasm": self.wasm,
            "zkey": self.zkey,
        }]);
        let result = self
            .rpc
            .call("zk_prove", params)
            .await
            .map_err(|e| WalletError::ProofGeneration(e.to_string()))?;

        let signals = result["publicSignals"]
            .as_array()
            .ok_or_else(|| WalletError::ProofGeneration("missing publicSignals".to_string()))?;
        let public_signals = signals
            .iter()
            .map(Self::parse_signal)
            .collect::<Result<Vec<_>, _>>()?;
        if public_signals.is_empty() {
            return Err(WalletError::ProofGeneration("empty publicSignals".to_string()));
        }

        let proof_hex = result["proof"]
            .as_str()
            .ok_or_else(|| WalletError::ProofGeneration("missing proof".to_string()))?;
        let proof = hex::decode(proof_hex.trim_start_matches("0x"))
            .map_err(|e| WalletError::ProofGeneration(format!("bad proof encoding: {}", e)))?;

        Ok(ProofBundle {
            public_signals,
            proof: proof.into(),
        })
    }
}

/// Deterministic digest-based stand-in for the circuit. NOT zero-knowledge:
/// the commitment is a plain hash of the secret and the "proof" binds
/// (commitment, nonce, binding_hash) publicly. Only for development and
/// tests. Runs on the blocking pool to model the real cost profile.
pub struct SimulatedProver;

const SIM_COMMITMENT_TAG: &[u8] = b"zkpass-sim-commitment-v1";
const SIM_PROOF_TAG: &[u8] = b"zkpass-sim-proof-v1";

impl SimulatedProver {
    pub fn commitment_of(secret: U256) -> U256 {
        let mut hasher = Sha256::new();
        hasher.update(SIM_COMMITMENT_TAG);
        hasher.update(secret.to_be_bytes::<32>());
        U256::from_be_bytes::<32>(hasher.finalize().into())
    }

    fn proof_of(commitment: U256, nonce: U256, binding_hash: U256) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(SIM_PROOF_TAG);
        hasher.update(commitment.to_be_bytes::<32>());
        hasher.update(nonce.to_be_bytes::<32>());
        hasher.update(binding_hash.to_be_bytes::<32>());
        hasher.finalize().into()
    }

    /// Check a bundle against the (nonce, binding_hash) it claims to bind.
    pub fn verify(bundle: &ProofBundle, nonce: U256, binding_hash: U256) -> bool {
        match bundle.commitment() {
            Some(commitment) => {
                bundle.proof.as_ref() == Self::proof_of(commitment, nonce, binding_hash).as_slice()
            }
            None => false,
        }
    }
}

#[async_trait]
impl PasswordProver for SimulatedProver {
    async fn generate_proof(
        &self,
        nonce: U256,
        binding_hash: U256,
        secret: U256,
    ) -> Result<ProofBundle, WalletError> {
        if secret.is_zero() {
            return Err(WalletError::ProofGeneration(
                "secret does not satisfy circuit constraints".to_string(),
            ));
        }
        let handle = tokio::task::spawn_blocking(move || {
            let commitment = Self::commitment_of(secret);
            let proof = Self::proof_of(commitment, nonce, binding_hash);
            ProofBundle {
                public_signals: vec![commitment],
                proof: Bytes::copy_from_slice(&proof),
            }
        });
        handle
            .await
            .map_err(|e| WalletError::ProofGeneration(format!("prover task failed: {}", e)))
    }
}
