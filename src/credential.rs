//! Password-derived credential ("passport") used as the zero-knowledge
//! proof's private witness. The secret exists only transiently in memory;
//! it is never serialized, logged or transmitted.

use alloy_primitives::{keccak256, B256, U256};

/// ENS-style recursive namehash (EIP-137).
pub fn namehash(name: &str) -> B256 {
    let mut node = B256::ZERO;
    if name.is_empty() {
        return node;
    }
    for label in name.rsplit('.') {
        let label_hash = keccak256(label.as_bytes());
        let mut buf = [0u8; 64];
        buf[..32].copy_from_slice(node.as_slice());
        buf[32..].copy_from_slice(label_hash.as_slice());
        node = keccak256(buf);
    }
    node
}

/// Namespace hash for a username under the wallet's fixed name suffix
/// (e.g. "alice" + ".zwallet.io").
pub fn account_node(username: &str, suffix: &str) -> B256 {
    namehash(&format!("{}{}", username, suffix))
}

/// Derive the secret witness from the namespace hash and password:
/// keccak256(node || utf8(password)). Deterministic per (node, password).
pub fn derive_passport(node: B256, password: &str) -> U256 {
    let mut buf = Vec::with_capacity(32 + password.len());
    buf.extend_from_slice(node.as_slice());
    buf.extend_from_slice(password.as_bytes());
    U256::from_be_bytes(keccak256(&buf).0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namehash_known_vectors() {
        // EIP-137 reference vectors
        assert_eq!(namehash(""), B256::ZERO);
        assert_eq!(
            format!("{:x}", namehash("eth")),
            "93cdeb708b7545dc668eb9280176169d1c33cfd8ed6f04690a0bcc88a93fc4ae"
        );
        assert_eq!(
            format!("{:x}", namehash("foo.eth")),
            "de9b09fd7c5f901e23a3f19fecc54828e9c848539801e86591bd9801b019f84f"
        );
    }

    #[test]
    fn test_account_node_matches_full_name() {
        assert_eq!(
            account_node("alice", ".zwallet.io"),
            namehash("alice.zwallet.io")
        );
    }

    #[test]
    fn test_passport_deterministic() {
        let node = account_node("alice", ".zwallet.io");
        let a = derive_passport(node, "hunter2");
        let b = derive_passport(node, "hunter2");
        assert_eq!(a, b);
    }

    #[test]
    fn test_passport_differs_per_password_and_namespace() {
        let node = account_node("alice", ".zwallet.io");
        let other = account_node("bob", ".zwallet.io");
        assert_ne!(derive_passport(node, "hunter2"), derive_passport(node, "hunter3"));
        assert_ne!(derive_passport(node, "hunter2"), derive_passport(other, "hunter2"));
    }
}
