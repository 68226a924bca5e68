use alloy_primitives::{address, Address};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WalletConfig {
    pub network: NetworkConfig,
    pub prover: ProverConfig,
}

/// Fixed network addresses and endpoints. Injected explicitly into the
/// resolver, assembler and clients at construction time; never ambient.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct NetworkConfig {
    pub endpoint: String,
    pub bundler: String,
    pub paymaster: String,
    pub entry_point: Address,
    pub account_factory: Address,
    pub registry: Address,
    #[serde(default = "default_name_suffix")]
    pub name_suffix: String,
}

/// Circuit artifact names handed to the prover backend, plus an optional
/// sidecar endpoint. No endpoint means the simulated backend is used.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProverConfig {
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default = "default_wasm")]
    pub wasm: String,
    #[serde(default = "default_zkey")]
    pub zkey: String,
}

fn default_name_suffix() -> String {
    ".zwallet.io".to_string()
}

fn default_wasm() -> String {
    "passport.wasm".to_string()
}

fn default_zkey() -> String {
    "passport_0001.zkey".to_string()
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self::testnet()
    }
}

impl WalletConfig {
    /// Testnet deployment the wallet was built against.
    pub fn testnet() -> Self {
        Self {
            network: NetworkConfig {
                endpoint: "https://babel-api.testnet.iotex.io".to_string(),
                bundler: "https://bundler.testnet.w3bstream.com".to_string(),
                paymaster: "https://paymaster.testnet.w3bstream.com/rpc".to_string(),
                entry_point: address!("c3527348De07d591c9d567ce1998eFA2031B8675"),
                account_factory: address!("1188fDa16947dB086408Dc47A3267Aa3C4Aca9c4"),
                registry: address!("845d8ccb0D92174B33AC9A876B65c49Ca4676685"),
                name_suffix: default_name_suffix(),
            },
            prover: ProverConfig {
                endpoint: None,
                wasm: default_wasm(),
                zkey: default_zkey(),
            },
        }
    }

    pub fn load_or_default(path: &str) -> Self {
        if std::path::Path::new(path).exists() {
            match std::fs::read_to_string(path) {
                Ok(s) => match toml::from_str(&s) {
                    Ok(c) => {
                        tracing::info!("Config loaded from {}", path);
                        c
                    }
                    Err(e) => {
                        tracing::warn!("Error parsing config: {}. Using defaults.", e);
                        Self::default()
                    }
                },
                Err(e) => {
                    tracing::warn!("Error reading config: {}. Using defaults.", e);
                    Self::default()
                }
            }
        } else {
            tracing::info!("Config file not found at '{}'. Creating default.", path);
            let config = Self::default();
            if let Ok(s) = toml::to_string_pretty(&config) {
                let _ = std::fs::write(path, s);
            }
            config
        }
    }
}
