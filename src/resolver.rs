//! Name resolution: maps a username to either a not-yet-deployed
//! deterministic address or an already-registered on-chain account, and
//! checks the proved commitment against the anchored one.

use alloy_primitives::{Address, B256, U256};

use crate::client::node::ChainReader;
use crate::config::NetworkConfig;
use crate::credential::account_node;
use crate::error::WalletError;

/// Local view of an account after resolution. The address is fixed for
/// the lifetime of the record; `deployed` records a local assumption,
/// not an observed confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountRecord {
    pub username: String,
    pub deployed: bool,
    pub address: Address,
    pub node: B256,
    pub commitment: U256,
}

/// First phase of resolution: the registry lookup, before any proof
/// exists. `resolver` is `None` for an unregistered (pending) name.
#[derive(Debug, Clone)]
pub struct NameLookup {
    pub node: B256,
    pub resolver: Option<Address>,
}

pub struct AccountResolver<'a, C: ChainReader> {
    chain: &'a C,
    config: &'a NetworkConfig,
}

impl<'a, C: ChainReader> AccountResolver<'a, C> {
    pub fn new(chain: &'a C, config: &'a NetworkConfig) -> Self {
        Self { chain, config }
    }

    /// Query the registry for the resolver bound to the username's
    /// namespace hash.
    pub async fn lookup(&self, username: &str) -> Result<NameLookup, WalletError> {
        let node = account_node(username, &self.config.name_suffix);
        let resolver = self
            .chain
            .resolver_of(self.config.registry, node)
            .await
            .map_err(|e| WalletError::Resolution(e.to_string()))?;
        tracing::debug!(username, ?resolver, "registry lookup");
        Ok(NameLookup {
            node,
            resolver: (resolver != Address::ZERO).then_some(resolver),
        })
    }

    /// Second phase: with the freshly proved commitment in hand, produce
    /// the account record. Deployed accounts must anchor the same
    /// commitment or the password is wrong.
    pub async fn finish(
        &self,
        username: &str,
        lookup: &NameLookup,
        commitment: U256,
    ) -> Result<AccountRecord, WalletError> {
        match lookup.resolver {
            None => {
                let address = self.derive_pending_address(username, commitment).await?;
                Ok(AccountRecord {
                    username: username.to_string(),
                    deployed: false,
                    address,
                    node: lookup.node,
                    commitment,
                })
            }
            Some(resolver) => {
                let address = self
                    .chain
                    .address_of(resolver, lookup.node)
                    .await
                    .map_err(|e| WalletError::Resolution(e.to_string()))?;
                let anchored = self
                    .chain
                    .pass_hash(address)
                    .await
                    .map_err(|e| WalletError::Resolution(e.to_string()))?;
                if anchored != commitment {
                    return Err(WalletError::PasswordMismatch);
                }
                Ok(AccountRecord {
                    username: username.to_string(),
                    deployed: true,
                    address,
                    node: lookup.node,
                    commitment,
                })
            }
        }
    }

    /// One-shot resolution for callers that already hold the commitment.
    pub async fn resolve(
        &self,
        username: &str,
        commitment: U256,
    ) -> Result<AccountRecord, WalletError> {
        let lookup = self.lookup(username).await?;
        self.finish(username, &lookup, commitment).await
    }

    /// Deterministic future address for an undeployed account. Stable
    /// across calls; depends only on (username, commitment) and the
    /// factory's deployment scheme.
    pub async fn derive_pending_address(
        &self,
        username: &str,
        commitment: U256,
    ) -> Result<Address, WalletError> {
        self.chain
            .deployment_address(self.config.account_factory, username, commitment)
            .await
            .map_err(|e| WalletError::Resolution(e.to_string()))
    }
}
