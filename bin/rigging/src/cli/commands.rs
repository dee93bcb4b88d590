use super::args::{HdArgs, RemoteArgs};
use crate::utils::parse_params;
use clap::Parser;
use ethers::utils::to_checksum;
use rigging_primitives::{derive_private_keys, HdAccountsConfig, JsonRpcCall};
use rigging_provider::{build_provider, BuildOptions, Transport};
use tracing::{info, warn};

/// Print the addresses derived from a mnemonic
#[derive(Debug, Parser)]
pub struct AccountsCommand {
    /// HD accounts args, the well-known test mnemonic is used if none is given
    #[clap(flatten)]
    accounts: HdArgs,
}

impl AccountsCommand {
    /// Execute the command
    pub fn execute(self) -> eyre::Result<()> {
        let config = match self.accounts.hd_config()? {
            Some(config) => config,
            None => {
                warn!("No mnemonic given, using the public test mnemonic");
                let mut config = HdAccountsConfig::default();
                config.path = self.accounts.path.clone();
                config.initial_index = self.accounts.initial_index;
                config.count = self.accounts.count;
                config
            }
        };

        let keys =
            derive_private_keys(&config.mnemonic, &config.path, config.initial_index, config.count)?;
        for (index, key) in (config.initial_index..).zip(keys) {
            println!("{index} {}", to_checksum(&key.address(), None));
        }
        Ok(())
    }
}

/// Send one JSON-RPC call through a provider pipeline
#[derive(Debug, Parser)]
pub struct RpcCommand {
    /// Remote network args
    #[clap(flatten)]
    remote: RemoteArgs,

    /// The JSON-RPC method.
    method: String,

    /// The params as JSON (an array, or a single value).
    params: Option<String>,
}

impl RpcCommand {
    /// Execute the command
    pub async fn execute(self) -> eyre::Result<()> {
        let params = match &self.params {
            Some(params) => parse_params(params).map_err(|err| eyre::eyre!(err))?,
            None => Vec::new(),
        };
        let config = self.remote.network_config()?;
        let client = build_provider(&self.remote.network, &config, &BuildOptions::default())?;

        info!("Sending {} to {}", self.method, self.remote.url);
        let result = client
            .send(JsonRpcCall::new(self.method, params))
            .await?;
        println!("{}", serde_json::to_string_pretty(&result)?);
        Ok(())
    }
}
