//! Canonical wire encoding for hashing and RPC transport.
//!
//! Every integer and byte sequence in a structured value is replaced by its
//! lowercase 0x-prefixed hex form with an even digit count. Sequence and key
//! order are preserved; the transform is idempotent.

use alloy_primitives::U256;
use serde_json::Value;

use crate::error::WalletError;

/// Lowercase 0x-hex for a byte slice. Empty input encodes as "0x".
pub fn hex_bytes(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Lowercase 0x-hex for an unsigned integer, minimal byte width.
/// Zero encodes as "0x00" (one byte, even digit count).
pub fn hex_uint(value: U256) -> String {
    if value.is_zero() {
        return "0x00".to_string();
    }
    format!("0x{}", hex::encode(value.to_be_bytes_trimmed_vec()))
}

/// Recursively canonicalize a JSON value. Integers and hex strings become
/// lowercase even-digit 0x-hex; arrays and objects keep their order.
/// Unsupported kinds (bool, null, float, non-hex string) fail with
/// `WalletError::Encoding`.
pub fn canonicalize(value: &Value) -> Result<Value, WalletError> {
    match value {
        Value::Number(n) => {
            let uint = n
                .as_u64()
                .ok_or_else(|| WalletError::Encoding(format!("unsupported number: {}", n)))?;
            Ok(Value::String(hex_uint(U256::from(uint))))
        }
        Value::String(s) => Ok(Value::String(normalize_hex_string(s)?)),
        Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(canonicalize(item)?);
            }
            Ok(Value::Array(out))
        }
        Value::Object(map) => {
            let mut out = serde_json::Map::new();
            for (key, item) in map {
                out.insert(key.clone(), canonicalize(item)?);
            }
            Ok(Value::Object(out))
        }
        other => Err(WalletError::Encoding(format!(
            "unsupported value kind: {}",
            other
        ))),
    }
}

fn normalize_hex_string(s: &str) -> Result<String, WalletError> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .ok_or_else(|| WalletError::Encoding(format!("not a hex string: {:?}", s)))?;
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(WalletError::Encoding(format!("not a hex string: {:?}", s)));
    }
    let lower = digits.to_ascii_lowercase();
    if lower.len() % 2 == 0 {
        Ok(format!("0x{}", lower))
    } else {
        Ok(format!("0x0{}", lower))
    }
}
