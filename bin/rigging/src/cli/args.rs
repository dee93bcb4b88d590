use crate::utils::{parse_address, parse_header, parse_u256};
use clap::Parser;
use educe::Educe;
use ethers::types::{Address, U256};
use expanded_pathbuf::ExpandedPathBuf;
use rigging_primitives::{
    constants::{
        accounts::{DEFAULT_COUNT, DEFAULT_HD_PATH, DEFAULT_INITIAL_INDEX},
        gas::DEFAULT_GAS_MULTIPLIER,
    },
    AccountsConfig, GasConfig, GasPriceConfig, HdAccountsConfig, NetworkConfig,
    RemoteNetworkConfig,
};

/// HD accounts args
#[derive(Clone, Educe, Parser)]
#[educe(Debug)]
pub struct HdArgs {
    /// The mnemonic phrase (prefer `--mnemonic-file`, this one ends up in the shell history).
    #[clap(long, conflicts_with = "mnemonic_file")]
    #[educe(Debug(ignore))]
    pub mnemonic: Option<String>,

    /// Path of a file holding the mnemonic phrase.
    #[clap(long)]
    pub mnemonic_file: Option<ExpandedPathBuf>,

    /// The HD derivation path, the account index is appended to it.
    #[clap(long = "hd-path", default_value = DEFAULT_HD_PATH)]
    pub path: String,

    /// Index of the first account.
    #[clap(long, default_value_t = DEFAULT_INITIAL_INDEX)]
    pub initial_index: u32,

    /// Number of accounts.
    #[clap(long, default_value_t = DEFAULT_COUNT)]
    pub count: u32,
}

impl HdArgs {
    /// HD accounts configuration, if a mnemonic was given
    pub fn hd_config(&self) -> eyre::Result<Option<HdAccountsConfig>> {
        let mnemonic = match (&self.mnemonic, &self.mnemonic_file) {
            (Some(mnemonic), _) => mnemonic.clone(),
            (None, Some(file)) => std::fs::read_to_string(&file.0)?.trim().to_string(),
            (None, None) => return Ok(None),
        };

        let mut config = HdAccountsConfig::new(mnemonic);
        config.path = self.path.clone();
        config.initial_index = self.initial_index;
        config.count = self.count;
        Ok(Some(config))
    }
}

/// Remote network args
#[derive(Clone, Debug, Parser)]
pub struct RemoteArgs {
    /// Name of the network.
    #[clap(long, default_value = "remote")]
    pub network: String,

    /// URL of the JSON-RPC endpoint.
    #[clap(long, default_value = "http://127.0.0.1:8545")]
    pub url: String,

    /// Expected chain id, checked before the first call.
    #[clap(long)]
    pub chain_id: Option<u64>,

    /// Extra HTTP header (`Name: value`), may be repeated.
    #[clap(long = "header", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// Request timeout in milliseconds.
    #[clap(long)]
    pub timeout: Option<u64>,

    /// Default sender of transactions.
    #[clap(long, value_parser = parse_address)]
    pub from: Option<Address>,

    /// Fixed gas limit of transactions.
    #[clap(long, value_parser = parse_u256)]
    pub gas: Option<U256>,

    /// Multiplier applied to gas estimations when no gas limit is fixed.
    #[clap(long, default_value_t = DEFAULT_GAS_MULTIPLIER)]
    pub gas_multiplier: f64,

    /// Fixed gas price of transactions (wei).
    #[clap(long, value_parser = parse_u256)]
    pub gas_price: Option<U256>,

    /// Accounts signing transactions locally.
    #[clap(flatten)]
    pub accounts: HdArgs,
}

impl RemoteArgs {
    pub fn network_config(&self) -> eyre::Result<NetworkConfig> {
        let mut config = RemoteNetworkConfig::new(self.url.clone());
        config.http_headers = self.headers.iter().cloned().collect();
        config.timeout = self.timeout;
        config.chain_id = self.chain_id;
        config.from = self.from;
        config.gas = self.gas.map_or(GasConfig::Auto(self.gas_multiplier), GasConfig::Fixed);
        config.gas_price = self.gas_price.map_or(GasPriceConfig::Auto, GasPriceConfig::Fixed);
        config.accounts = self.accounts.hd_config()?.map(AccountsConfig::Hd);
        Ok(NetworkConfig::Remote(config))
    }
}
