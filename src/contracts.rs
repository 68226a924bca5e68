//! ABI surfaces of the on-chain collaborators. Only the functions this
//! core consumes are declared.

use alloy_sol_types::sol;

sol! {
    /// Name registry: maps a namespace hash to its resolver.
    /// A zero resolver means the name is unregistered.
    interface INSRegistry {
        function resolver(bytes32 node) external view returns (address);
    }

    /// Public resolver: maps a namespace hash to the account address.
    interface PublicResolver {
        function addr(bytes32 node) external view returns (address);
    }

    /// Deployed wallet account contract.
    interface ZKPassAccount {
        function passHash() external view returns (uint256);
        function email() external view returns (bytes32);
        function execute(address dest, uint256 value, bytes calldata func) external;
    }

    /// Account factory with a deterministic deployment address scheme.
    interface ZKPassAccountFactory {
        function getAddress(string calldata name, uint256 passHash) external view returns (address);
        function createAccount(string calldata name, uint256 passHash) external returns (address);
    }

    /// Entry-point nonce surface (ERC-4337 v0.6).
    interface IEntryPoint {
        function getNonce(address sender, uint192 key) external view returns (uint256);
    }
}
