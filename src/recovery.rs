//! Out-of-band recovery message. Fixed textual layout:
//! "01" + decimal chain id + lowercase account address hex (no prefix) +
//! password-hash commitment as 64 lowercase hex digits.

use alloy_primitives::{Address, U256};

use crate::error::WalletError;

pub const RECOVERY_FORMAT_VERSION: &str = "01";

pub fn recovery_message(
    chain_id: u64,
    address: Address,
    commitment: U256,
) -> Result<String, WalletError> {
    if address == Address::ZERO {
        return Err(WalletError::Format("zero account address".to_string()));
    }
    if chain_id == 0 {
        return Err(WalletError::Format("zero chain id".to_string()));
    }
    Ok(format!(
        "{}{}{}{}",
        RECOVERY_FORMAT_VERSION,
        chain_id,
        hex::encode(address.as_slice()),
        hex::encode(commitment.to_be_bytes::<32>()),
    ))
}
