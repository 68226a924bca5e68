use thiserror::Error;

/// Error taxonomy for the wallet core. Each stage of the login/operation
/// flow fails with its own variant so callers can distinguish "try again",
/// "offer recovery" and "account not found".
#[derive(Error, Debug)]
pub enum WalletError {
    #[error("Resolution error: {0}")]
    Resolution(String),
    #[error("Password does not match the on-chain commitment")]
    PasswordMismatch,
    #[error("Account not found: {0}")]
    AccountNotFound(String),
    #[error("No email guardian configured for {0}")]
    GuardianMissing(String),
    #[error("Proof generation failed: {0}")]
    ProofGeneration(String),
    #[error("Operation assembly failed: {0}")]
    Assembly(String),
    #[error("Signing failed: {0}")]
    Signing(String),
    #[error("Paymaster sponsorship failed: {0}")]
    Sponsorship(String),
    #[error("Bundler submission failed: {0}")]
    Submission(String),
    #[error("Encoding error: {0}")]
    Encoding(String),
    #[error("Malformed input: {0}")]
    Format(String),
    #[error("RPC error: {0}")]
    Rpc(String),
}

impl WalletError {
    /// True for errors that should route the caller into the recovery
    /// flow instead of aborting the session outright.
    pub fn offers_recovery(&self) -> bool {
        matches!(self, WalletError::PasswordMismatch)
    }
}
