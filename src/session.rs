//! Per-account session: sequences resolution, proving, assembly,
//! sponsorship, signing and submission. One operation is in flight at a
//! time; callers serialize attempts per account. No automatic retries;
//! every fatal error returns the session to `Idle`.

use alloy_primitives::U256;

use crate::client::bundler::Relay;
use crate::client::node::ChainReader;
use crate::client::paymaster::Sponsor;
use crate::config::WalletConfig;
use crate::error::WalletError;
use crate::operation::{guardian_intent, CallIntent, OperationAssembler};
use crate::prover::PasswordProver;
use crate::recovery::recovery_message;
use crate::resolver::{AccountRecord, AccountResolver};
use crate::signer::ZkSigner;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Resolving,
    Proving,
    Assembling,
    AwaitingSponsorship,
    Signing,
    Submitted,
    /// Password mismatch or similar: the caller should offer the recovery
    /// flow for this attempt instead of retrying.
    RecoveryOffered,
}

pub struct WalletSession<C, P, S, R> {
    config: WalletConfig,
    chain: C,
    prover: P,
    paymaster: S,
    bundler: R,
    state: SessionState,
    account: Option<AccountRecord>,
    secret: Option<U256>,
}

impl<C, P, S, R> WalletSession<C, P, S, R>
where
    C: ChainReader,
    P: PasswordProver,
    S: Sponsor,
    R: Relay,
{
    pub fn new(config: WalletConfig, chain: C, prover: P, paymaster: S, bundler: R) -> Self {
        Self {
            config,
            chain,
            prover,
            paymaster,
            bundler,
            state: SessionState::Idle,
            account: None,
            secret: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn account(&self) -> Option<&AccountRecord> {
        self.account.as_ref()
    }

    pub fn is_logged_in(&self) -> bool {
        self.account.is_some()
    }

    pub fn logout(&mut self) {
        self.account = None;
        self.secret = None;
        self.state = SessionState::Idle;
    }

    fn fail<T>(&mut self, err: WalletError) -> Result<T, WalletError> {
        self.state = if err.offers_recovery() {
            SessionState::RecoveryOffered
        } else {
            SessionState::Idle
        };
        Err(err)
    }

    fn checked_inputs<'i>(
        username: &'i str,
        password: &'i str,
    ) -> Result<(&'i str, &'i str), WalletError> {
        let username = username.trim();
        let password = password.trim();
        if username.is_empty() {
            return Err(WalletError::Format("account name is empty".to_string()));
        }
        if password.is_empty() {
            return Err(WalletError::Format("password is empty".to_string()));
        }
        Ok((username, password))
    }

    /// Resolve the account and prove knowledge of the password. On
    /// success the session holds the account record and the derived
    /// secret for later signing.
    pub async fn login(
        &mut self,
        username: &str,
        password: &str,
    ) -> Result<&AccountRecord, WalletError> {
        let (username, password) = Self::checked_inputs(username, password)?;

        self.state = SessionState::Resolving;
        let lookup = match AccountResolver::new(&self.chain, &self.config.network)
            .lookup(username)
            .await
        {
            Ok(lookup) => lookup,
            Err(e) => return self.fail(e),
        };

        self.state = SessionState::Proving;
        let secret = crate::credential::derive_passport(lookup.node, password);
        let bundle = match self
            .prover
            .generate_proof(U256::ZERO, U256::ZERO, secret)
            .await
        {
            Ok(bundle) => bundle,
            Err(e) => return self.fail(e),
        };
        let commitment = match bundle.commitment() {
            Some(commitment) => commitment,
            None => {
                return self.fail(WalletError::ProofGeneration(
                    "prover returned no public signals".to_string(),
                ))
            }
        };

        let record = match AccountResolver::new(&self.chain, &self.config.network)
            .finish(username, &lookup, commitment)
            .await
        {
            Ok(record) => record,
            Err(e) => return self.fail(e),
        };
        tracing::info!(
            username,
            address = %record.address,
            deployed = record.deployed,
            "logged in"
        );

        self.secret = Some(secret);
        self.state = SessionState::Idle;
        Ok(self.account.insert(record))
    }

    /// Native balance of the logged-in account.
    pub async fn balance(&self) -> Result<U256, WalletError> {
        let account = self
            .account
            .as_ref()
            .ok_or_else(|| WalletError::Format("not logged in".to_string()))?;
        self.chain.balance_of(account.address).await
    }

    /// Build, sponsor, sign and submit one operation. Returns the
    /// bundler's operation-hash identifier.
    pub async fn submit(&mut self, intent: &CallIntent) -> Result<String, WalletError> {
        let (account, secret) = match (self.account.clone(), self.secret) {
            (Some(account), Some(secret)) => (account, secret),
            _ => return Err(WalletError::Format("not logged in".to_string())),
        };

        self.state = SessionState::Assembling;
        let assembler = OperationAssembler::new(&self.chain, &self.config.network);
        let unsponsored = match assembler.assemble(intent, &account).await {
            Ok(op) => op,
            Err(e) => return self.fail(e),
        };

        self.state = SessionState::AwaitingSponsorship;
        let wire = match unsponsored.to_rpc_value() {
            Ok(wire) => wire,
            Err(e) => return self.fail(e),
        };
        let paymaster_data = match self.paymaster.sponsor(&wire).await {
            Ok(data) => data,
            Err(e) => return self.fail(e),
        };
        // Two distinct values: the sponsorship payload is embedded before
        // the binding hash is computed.
        let sponsored = unsponsored.with_paymaster_data(paymaster_data);

        self.state = SessionState::Signing;
        let chain_id = match self.chain.chain_id().await {
            Ok(id) => id,
            Err(e) => return self.fail(WalletError::Signing(e.to_string())),
        };
        let signer = ZkSigner::from_secret(secret, sponsored.nonce, &self.prover);
        let signed = match signer
            .sign_operation(sponsored, self.config.network.entry_point, chain_id)
            .await
        {
            Ok(op) => op,
            Err(e) => return self.fail(e),
        };

        let wire = match signed.to_rpc_value() {
            Ok(wire) => wire,
            Err(e) => return self.fail(e),
        };
        let op_hash = match self
            .bundler
            .send_user_operation(&wire, self.config.network.entry_point)
            .await
        {
            Ok(hash) => hash,
            Err(e) => return self.fail(e),
        };
        tracing::info!(op_hash, "operation submitted");

        // First successful operation for a pending account deploys it.
        if let Some(record) = self.account.as_mut() {
            record.deployed = true;
        }
        self.state = SessionState::Submitted;
        Ok(op_hash)
    }

    /// Anchor an email guardian on the logged-in account: a self-call
    /// carrying the guardian selector and the email hash, run through the
    /// normal sponsor/sign/submit pipeline.
    pub async fn add_email_guardian(&mut self, email: &str) -> Result<String, WalletError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(WalletError::Format("email is empty".to_string()));
        }
        let account = self
            .account
            .as_ref()
            .ok_or_else(|| WalletError::Format("not logged in".to_string()))?;
        let intent = guardian_intent(account.address, email);
        self.submit(&intent).await
    }

    /// Produce the out-of-band recovery message for a deployed account
    /// with an email guardian configured.
    pub async fn generate_recovery(
        &mut self,
        username: &str,
        password: &str,
    ) -> Result<String, WalletError> {
        let (username, password) = Self::checked_inputs(username, password)?;

        self.state = SessionState::Resolving;
        let resolver = AccountResolver::new(&self.chain, &self.config.network);
        let lookup = match resolver.lookup(username).await {
            Ok(lookup) => lookup,
            Err(e) => return self.fail(e),
        };
        let Some(resolver_address) = lookup.resolver else {
            return self.fail(WalletError::AccountNotFound(format!(
                "{}{}",
                username, self.config.network.name_suffix
            )));
        };
        let address = match self.chain.address_of(resolver_address, lookup.node).await {
            Ok(address) => address,
            Err(e) => return self.fail(WalletError::Resolution(e.to_string())),
        };
        let guardian = match self.chain.email_guardian(address).await {
            Ok(guardian) => guardian,
            Err(e) => return self.fail(WalletError::Resolution(e.to_string())),
        };
        if guardian == alloy_primitives::B256::ZERO {
            return self.fail(WalletError::GuardianMissing(format!(
                "{}{}",
                username, self.config.network.name_suffix
            )));
        }

        self.state = SessionState::Proving;
        let secret = crate::credential::derive_passport(lookup.node, password);
        let bundle = match self
            .prover
            .generate_proof(U256::ZERO, U256::ZERO, secret)
            .await
        {
            Ok(bundle) => bundle,
            Err(e) => return self.fail(e),
        };
        let commitment = match bundle.commitment() {
            Some(commitment) => commitment,
            None => {
                return self.fail(WalletError::ProofGeneration(
                    "prover returned no public signals".to_string(),
                ))
            }
        };

        let chain_id = match self.chain.chain_id().await {
            Ok(id) => id,
            Err(e) => return self.fail(WalletError::Resolution(e.to_string())),
        };
        let message = match recovery_message(chain_id, address, commitment) {
            Ok(message) => message,
            Err(e) => return self.fail(e),
        };
        self.state = SessionState::Idle;
        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential::{account_node, derive_passport};
    use crate::operation::UserOperation;
    use crate::prover::SimulatedProver;
    use crate::signer::verify_signature;
    use alloy_primitives::{address, Address, B256, Bytes};
    use async_trait::async_trait;
    use serde_json::Value;
    use std::sync::Mutex;

    const CHAIN_ID: u64 = 4690;

    /// One configurable account behind registry, resolver, account and
    /// factory views.
    struct FakeChain {
        deployed: Option<DeployedAccount>,
        nonce: U256,
    }

    struct DeployedAccount {
        node: B256,
        address: Address,
        commitment: U256,
        guardian: B256,
    }

    #[async_trait]
    impl ChainReader for FakeChain {
        async fn chain_id(&self) -> Result<u64, WalletError> {
            Ok(CHAIN_ID)
        }
        async fn gas_price(&self) -> Result<U256, WalletError> {
            Ok(U256::from(2_000_000_000u64))
        }
        async fn max_priority_fee(&self) -> Result<U256, WalletError> {
            Ok(U256::from(1_000_000_000u64))
        }
        async fn balance_of(&self, _address: Address) -> Result<U256, WalletError> {
            Ok(U256::ZERO)
        }
        async fn resolver_of(&self, _registry: Address, node: B256) -> Result<Address, WalletError> {
            match &self.deployed {
                Some(acct) if acct.node == node => {
                    Ok(address!("3333333333333333333333333333333333333333"))
                }
                _ => Ok(Address::ZERO),
            }
        }
        async fn address_of(&self, _resolver: Address, node: B256) -> Result<Address, WalletError> {
            match &self.deployed {
                Some(acct) if acct.node == node => Ok(acct.address),
                _ => Ok(Address::ZERO),
            }
        }
        async fn pass_hash(&self, account: Address) -> Result<U256, WalletError> {
            match &self.deployed {
                Some(acct) if acct.address == account => Ok(acct.commitment),
                _ => Ok(U256::ZERO),
            }
        }
        async fn email_guardian(&self, account: Address) -> Result<B256, WalletError> {
            match &self.deployed {
                Some(acct) if acct.address == account => Ok(acct.guardian),
                _ => Ok(B256::ZERO),
            }
        }
        async fn deployment_address(
            &self,
            _factory: Address,
            username: &str,
            commitment: U256,
        ) -> Result<Address, WalletError> {
            let mut buf = Vec::new();
            buf.extend_from_slice(username.as_bytes());
            buf.extend_from_slice(&commitment.to_be_bytes::<32>());
            Ok(Address::from_slice(
                &alloy_primitives::keccak256(&buf)[12..],
            ))
        }
        async fn entry_point_nonce(
            &self,
            _entry_point: Address,
            _sender: Address,
        ) -> Result<U256, WalletError> {
            Ok(self.nonce)
        }
    }

    /// Records the canonical operation it sponsored and returns a fixed
    /// payload.
    struct FakePaymaster {
        seen: Mutex<Option<Value>>,
        refuse: bool,
    }

    #[async_trait]
    impl Sponsor for FakePaymaster {
        async fn sponsor(&self, operation: &Value) -> Result<Bytes, WalletError> {
            if self.refuse {
                return Err(WalletError::Sponsorship("refused".to_string()));
            }
            *self.seen.lock().unwrap() = Some(operation.clone());
            Ok(Bytes::from_static(&[0xab, 0xcd, 0xef]))
        }
    }

    /// Verifies the submitted operation's embedded proof before accepting.
    struct FakeBundler {
        entry_point: Address,
        expected_commitment: U256,
    }

    #[async_trait]
    impl Relay for FakeBundler {
        async fn send_user_operation(
            &self,
            operation: &Value,
            entry_point: Address,
        ) -> Result<String, WalletError> {
            assert_eq!(entry_point, self.entry_point);
            let op: UserOperation = serde_json::from_value(operation.clone())
                .map_err(|e| WalletError::Submission(e.to_string()))?;
            if !verify_signature(&op, entry_point, CHAIN_ID, self.expected_commitment) {
                return Err(WalletError::Submission("invalid signature".to_string()));
            }
            Ok("0xophash".to_string())
        }
    }

    fn commitment_for(username: &str, password: &str) -> U256 {
        let node = account_node(username, ".zwallet.io");
        SimulatedProver::commitment_of(derive_passport(node, password))
    }

    fn session(
        deployed: Option<DeployedAccount>,
        refuse_sponsorship: bool,
        expected_commitment: U256,
    ) -> WalletSession<FakeChain, SimulatedProver, FakePaymaster, FakeBundler> {
        let config = WalletConfig::testnet();
        let entry_point = config.network.entry_point;
        WalletSession::new(
            config,
            FakeChain {
                deployed,
                nonce: U256::from(4u64),
            },
            SimulatedProver,
            FakePaymaster {
                seen: Mutex::new(None),
                refuse: refuse_sponsorship,
            },
            FakeBundler {
                entry_point,
                expected_commitment,
            },
        )
    }

    fn deployed_alice(password: &str) -> DeployedAccount {
        DeployedAccount {
            node: account_node("alice", ".zwallet.io"),
            address: address!("2222222222222222222222222222222222222222"),
            commitment: commitment_for("alice", password),
            guardian: B256::with_last_byte(1),
        }
    }

    fn intent() -> CallIntent {
        CallIntent {
            target: address!("A3Ce183b2EA38053f85A160857E6f6A8C10EF5f7"),
            value: U256::ZERO,
            call_data: Bytes::from_static(&[0x12, 0x49, 0xc5, 0x8b]),
        }
    }

    #[tokio::test]
    async fn test_login_pending_account() {
        let expected = commitment_for("alice", "hunter2");
        let mut session = session(None, false, expected);
        let record = session.login("alice", "hunter2").await.unwrap();
        assert!(!record.deployed);
        assert_eq!(record.commitment, expected);
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.is_logged_in());
    }

    #[tokio::test]
    async fn test_login_deployed_account_matching_password() {
        let expected = commitment_for("alice", "hunter2");
        let mut session = session(Some(deployed_alice("hunter2")), false, expected);
        let record = session.login("alice", "hunter2").await.unwrap();
        assert!(record.deployed);
        assert_eq!(
            record.address,
            address!("2222222222222222222222222222222222222222")
        );
    }

    #[tokio::test]
    async fn test_login_wrong_password_offers_recovery() {
        let expected = commitment_for("alice", "hunter2");
        let mut session = session(Some(deployed_alice("hunter2")), false, expected);
        let err = session.login("alice", "wrong").await.unwrap_err();
        assert!(matches!(err, WalletError::PasswordMismatch));
        assert_eq!(session.state(), SessionState::RecoveryOffered);
        assert!(!session.is_logged_in());
    }

    #[tokio::test]
    async fn test_login_rejects_empty_inputs() {
        let mut session = session(None, false, U256::ZERO);
        assert!(matches!(
            session.login("  ", "hunter2").await.unwrap_err(),
            WalletError::Format(_)
        ));
        assert!(matches!(
            session.login("alice", "").await.unwrap_err(),
            WalletError::Format(_)
        ));
    }

    #[tokio::test]
    async fn test_submit_pending_account_end_to_end() {
        let expected = commitment_for("alice", "hunter2");
        let mut session = session(None, false, expected);
        session.login("alice", "hunter2").await.unwrap();

        let op_hash = session.submit(&intent()).await.unwrap();
        assert_eq!(op_hash, "0xophash");
        assert_eq!(session.state(), SessionState::Submitted);

        // paymaster saw the unsponsored canonical form
        let seen = session.paymaster.seen.lock().unwrap().clone().unwrap();
        assert_eq!(seen["paymasterAndData"], "0x");
        assert_eq!(seen["signature"], "0x");
        assert_ne!(seen["initCode"], "0x");

        // the account is now assumed deployed; the next operation carries
        // no init-code
        assert!(session.account().unwrap().deployed);
    }

    #[tokio::test]
    async fn test_submit_requires_login() {
        let mut session = session(None, false, U256::ZERO);
        let err = session.submit(&intent()).await.unwrap_err();
        assert!(matches!(err, WalletError::Format(_)));
    }

    #[tokio::test]
    async fn test_sponsorship_refusal_resets_to_idle() {
        let expected = commitment_for("alice", "hunter2");
        let mut session = session(Some(deployed_alice("hunter2")), true, expected);
        session.login("alice", "hunter2").await.unwrap();

        let err = session.submit(&intent()).await.unwrap_err();
        assert!(matches!(err, WalletError::Sponsorship(_)));
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[tokio::test]
    async fn test_add_email_guardian_is_a_self_call() {
        let expected = commitment_for("alice", "hunter2");
        let mut session = session(Some(deployed_alice("hunter2")), false, expected);
        session.login("alice", "hunter2").await.unwrap();

        let op_hash = session.add_email_guardian("alice@example.com").await.unwrap();
        assert_eq!(op_hash, "0xophash");

        let seen = session.paymaster.seen.lock().unwrap().clone().unwrap();
        assert_eq!(
            seen["sender"],
            "0x2222222222222222222222222222222222222222"
        );
        let call_data = seen["callData"].as_str().unwrap();
        let email_hash = alloy_primitives::keccak256("alice@example.com".as_bytes());
        assert!(call_data.contains("99a44531"));
        assert!(call_data.contains(&hex::encode(email_hash)));
    }

    #[tokio::test]
    async fn test_add_email_guardian_requires_login_and_email() {
        let mut logged_out = session(None, false, U256::ZERO);
        assert!(matches!(
            logged_out.add_email_guardian("alice@example.com").await.unwrap_err(),
            WalletError::Format(_)
        ));

        let expected = commitment_for("alice", "hunter2");
        let mut logged_in = session(Some(deployed_alice("hunter2")), false, expected);
        logged_in.login("alice", "hunter2").await.unwrap();
        assert!(matches!(
            logged_in.add_email_guardian("  ").await.unwrap_err(),
            WalletError::Format(_)
        ));
    }

    #[tokio::test]
    async fn test_generate_recovery_message() {
        let expected = commitment_for("alice", "hunter2");
        let mut session = session(Some(deployed_alice("hunter2")), false, expected);

        let message = session.generate_recovery("alice", "hunter2").await.unwrap();
        assert!(message.starts_with("014690"));
        assert!(message.contains("2222222222222222222222222222222222222222"));
        assert!(message.ends_with(&hex::encode(expected.to_be_bytes::<32>())));
    }

    #[tokio::test]
    async fn test_generate_recovery_unregistered_account() {
        let mut session = session(None, false, U256::ZERO);
        let err = session
            .generate_recovery("alice", "hunter2")
            .await
            .unwrap_err();
        assert!(matches!(err, WalletError::AccountNotFound(_)));
    }

    #[tokio::test]
    async fn test_generate_recovery_requires_guardian() {
        let mut account = deployed_alice("hunter2");
        account.guardian = B256::ZERO;
        let expected = commitment_for("alice", "hunter2");
        let mut session = session(Some(account), false, expected);
        let err = session
            .generate_recovery("alice", "hunter2")
            .await
            .unwrap_err();
        assert!(matches!(err, WalletError::GuardianMissing(_)));
    }
}
