//! Network and account configuration
//!
//! Every type here can be deserialized (camelCase keys) so callers can load it from any
//! serde-compatible format. Validation of numeric local-network fields happens upstream.

use crate::{
    constants::{
        accounts::{DEFAULT_BALANCE, DEFAULT_COUNT, DEFAULT_HD_PATH, DEFAULT_INITIAL_INDEX, TEST_MNEMONIC},
        gas::DEFAULT_GAS_MULTIPLIER,
        network::{LOCAL_BLOCK_GAS_LIMIT, LOCAL_CHAIN_ID},
    },
    utils::{deserialize_u256, deserialize_u256_opt},
    PrivateKey,
};
use educe::Educe;
use ethers::types::{Address, U256};
use expanded_pathbuf::ExpandedPathBuf;
use serde::Deserialize;
use std::collections::HashMap;
use strum_macros::{Display, EnumString, EnumVariantNames};

/// Configuration of the network a provider is built for
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum NetworkConfig {
    /// In-process simulated chain
    Local(LocalNetworkConfig),
    /// Remote JSON-RPC endpoint
    Remote(RemoteNetworkConfig),
}

impl NetworkConfig {
    pub fn is_remote(&self) -> bool {
        matches!(self, NetworkConfig::Remote(_))
    }

    /// Accounts managed by the provider, if any
    pub fn accounts(&self) -> Option<&AccountsConfig> {
        match self {
            NetworkConfig::Local(config) => Some(&config.accounts),
            NetworkConfig::Remote(config) => config.accounts.as_ref(),
        }
    }

    /// Default sender of transactions, if configured
    pub fn from(&self) -> Option<Address> {
        match self {
            NetworkConfig::Local(config) => config.from,
            NetworkConfig::Remote(config) => config.from,
        }
    }

    pub fn gas(&self) -> &GasConfig {
        match self {
            NetworkConfig::Local(config) => &config.gas,
            NetworkConfig::Remote(config) => &config.gas,
        }
    }

    pub fn gas_price(&self) -> &GasPriceConfig {
        match self {
            NetworkConfig::Local(config) => &config.gas_price,
            NetworkConfig::Remote(config) => &config.gas_price,
        }
    }
}

/// Local simulated chain configuration
#[derive(Clone, Debug, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LocalNetworkConfig {
    pub forking: Option<ForkingConfig>,
    pub hardfork: Hardfork,
    pub chain_id: u64,
    pub network_id: u64,
    pub block_gas_limit: u64,
    pub throw_on_transaction_failures: bool,
    pub throw_on_call_failures: bool,
    pub accounts: AccountsConfig,
    pub allow_unlimited_contract_size: bool,
    /// RFC 3339 timestamp or `YYYY-MM-DD` date of the genesis block
    pub initial_date: Option<String>,
    pub logging_enabled: bool,
    pub from: Option<Address>,
    pub gas: GasConfig,
    pub gas_price: GasPriceConfig,
}

impl Default for LocalNetworkConfig {
    fn default() -> Self {
        Self {
            forking: None,
            hardfork: Hardfork::default(),
            chain_id: LOCAL_CHAIN_ID,
            network_id: LOCAL_CHAIN_ID,
            block_gas_limit: LOCAL_BLOCK_GAS_LIMIT,
            throw_on_transaction_failures: true,
            throw_on_call_failures: true,
            accounts: AccountsConfig::default(),
            allow_unlimited_contract_size: false,
            initial_date: None,
            logging_enabled: false,
            from: None,
            gas: GasConfig::default(),
            gas_price: GasPriceConfig::default(),
        }
    }
}

/// Forking descriptor of the local simulated chain
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ForkingConfig {
    pub url: String,
    pub block_number: Option<u64>,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

/// Remote JSON-RPC network configuration
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteNetworkConfig {
    pub url: String,
    #[serde(default)]
    pub http_headers: HashMap<String, String>,
    /// Request timeout in milliseconds
    #[serde(default)]
    pub timeout: Option<u64>,
    /// Accounts signed for locally; `None` leaves signing to the node
    #[serde(default)]
    pub accounts: Option<AccountsConfig>,
    #[serde(default)]
    pub gas: GasConfig,
    #[serde(default)]
    pub gas_price: GasPriceConfig,
    #[serde(default)]
    pub from: Option<Address>,
    #[serde(default)]
    pub chain_id: Option<u64>,
}

impl RemoteNetworkConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            http_headers: HashMap::new(),
            timeout: None,
            accounts: None,
            gas: GasConfig::default(),
            gas_price: GasPriceConfig::default(),
            from: None,
            chain_id: None,
        }
    }
}

/// Accounts configuration
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum AccountsConfig {
    /// Explicit list of private keys with their balances
    List(Vec<DerivedAccount>),
    /// Accounts derived from a mnemonic
    Hd(HdAccountsConfig),
}

impl Default for AccountsConfig {
    fn default() -> Self {
        AccountsConfig::Hd(HdAccountsConfig::default())
    }
}

/// An account whose private key is known, with the balance it should be funded with
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DerivedAccount {
    pub private_key: PrivateKey,
    #[serde(default = "default_balance", deserialize_with = "deserialize_u256")]
    pub balance: U256,
}

/// Default account balance (see [DEFAULT_BALANCE](DEFAULT_BALANCE))
pub fn default_balance() -> U256 {
    U256::from_dec_str(DEFAULT_BALANCE).unwrap_or_default()
}

/// Hierarchical deterministic accounts configuration
#[derive(Clone, Educe, Deserialize)]
#[educe(Debug)]
#[serde(rename_all = "camelCase")]
pub struct HdAccountsConfig {
    #[educe(Debug(ignore))]
    pub mnemonic: String,
    #[serde(default = "default_hd_path")]
    pub path: String,
    #[serde(default = "default_initial_index")]
    pub initial_index: u32,
    #[serde(default = "default_count")]
    pub count: u32,
    #[serde(default, deserialize_with = "deserialize_u256_opt")]
    pub accounts_balance: Option<U256>,
}

impl HdAccountsConfig {
    pub fn new(mnemonic: impl Into<String>) -> Self {
        Self {
            mnemonic: mnemonic.into(),
            path: default_hd_path(),
            initial_index: DEFAULT_INITIAL_INDEX,
            count: DEFAULT_COUNT,
            accounts_balance: None,
        }
    }
}

impl Default for HdAccountsConfig {
    fn default() -> Self {
        Self::new(TEST_MNEMONIC)
    }
}

fn default_hd_path() -> String {
    DEFAULT_HD_PATH.to_string()
}

fn default_initial_index() -> u32 {
    DEFAULT_INITIAL_INDEX
}

fn default_count() -> u32 {
    DEFAULT_COUNT
}

/// Gas limit policy
#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum GasConfig {
    /// Estimate the gas limit and scale it by the multiplier
    Auto(f64),
    /// Use this gas limit
    Fixed(#[serde(deserialize_with = "deserialize_u256")] U256),
}

impl Default for GasConfig {
    fn default() -> Self {
        GasConfig::Auto(DEFAULT_GAS_MULTIPLIER)
    }
}

/// Gas price policy
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum GasPriceConfig {
    /// Ask the node for the current gas price
    #[default]
    Auto,
    /// Use this gas price
    Fixed(#[serde(deserialize_with = "deserialize_u256")] U256),
}

/// Hardforks understood by the local simulated chain
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Display, EnumString, EnumVariantNames, PartialEq, Eq,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase", ascii_case_insensitive)]
pub enum Hardfork {
    Byzantium,
    Constantinople,
    Petersburg,
    Istanbul,
    MuirGlacier,
    Berlin,
    London,
    ArrowGlacier,
    GrayGlacier,
    Merge,
    #[default]
    Shanghai,
    Cancun,
}

/// Project directories forwarded to the local simulated chain
#[derive(Clone, Debug)]
pub struct ProjectPaths {
    pub root: ExpandedPathBuf,
    pub sources: ExpandedPathBuf,
    pub tests: ExpandedPathBuf,
    pub cache: ExpandedPathBuf,
    pub artifacts: ExpandedPathBuf,
}
