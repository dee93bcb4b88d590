//! Rigging primitive types
//!
//! This crate contains the network and account configuration types, HD key derivation and
//! JSON-RPC call primitives used to build Ethereum providers.

pub mod accounts;
pub mod config;
pub mod constants;
pub mod keys;
pub mod rpc;
mod utils;

pub use accounts::normalize_accounts;
pub use config::{
    AccountsConfig, DerivedAccount, ForkingConfig, GasConfig, GasPriceConfig, Hardfork,
    HdAccountsConfig, LocalNetworkConfig, NetworkConfig, ProjectPaths, RemoteNetworkConfig,
};
pub use keys::{derive_private_keys, is_valid_hd_path, KeyDerivationError, MnemonicRef, PrivateKey};
pub use rpc::JsonRpcCall;
pub use utils::{deserialize_u256, deserialize_u256_opt, parse_quantity, to_quantity};
