// Client module
pub mod bundler;
pub mod node;
pub mod paymaster;
pub mod rpc;

pub use bundler::{BundlerClient, Relay};
pub use node::{ChainReader, NodeClient};
pub use paymaster::{PaymasterClient, Sponsor};
pub use rpc::JsonRpcClient;
