//! Local simulated chain base transport
//!
//! The simulated chain itself is an external node. This module only collects the options it is
//! started with and launches it lazily, on the first call sent through [LocalTransport].
use crate::{
    error::{ProviderError, ProviderResult},
    transport::{JsonRpcClientTransport, Transport},
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use ethers::{
    providers::Http,
    utils::{Anvil, AnvilInstance},
};
use rigging_primitives::{
    constants::methods::ANVIL_SET_BALANCE, to_quantity, DerivedAccount, ForkingConfig, Hardfork,
    JsonRpcCall, LocalNetworkConfig, ProjectPaths,
};
use serde_json::{json, Value};
use std::{fmt, path::PathBuf, sync::Arc};
use tokio::sync::OnceCell;
use tracing::{debug, info};

/// Opaque debugging hook forwarded to the local node launcher
pub trait MessageTraceHook: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;
}

/// Options the local simulated chain is started with
#[derive(Clone, Debug)]
pub struct LocalNodeOptions {
    pub hardfork: Hardfork,
    pub chain_id: u64,
    pub network_id: u64,
    pub block_gas_limit: u64,
    pub throw_on_transaction_failures: bool,
    pub throw_on_call_failures: bool,
    pub allow_unlimited_contract_size: bool,
    /// Genesis timestamp (unix seconds)
    pub initial_date: Option<i64>,
    pub logging_enabled: bool,
    /// Present only when a fork url is configured and forking is enabled
    pub fork: Option<ForkingConfig>,
    pub accounts: Vec<DerivedAccount>,
    pub paths: Option<ProjectPaths>,
    pub trace_hooks: Vec<Arc<dyn MessageTraceHook>>,
}

impl LocalNodeOptions {
    pub fn new(
        config: &LocalNetworkConfig,
        accounts: Vec<DerivedAccount>,
        paths: Option<ProjectPaths>,
        trace_hooks: Vec<Arc<dyn MessageTraceHook>>,
    ) -> ProviderResult<Self> {
        let initial_date = config.initial_date.as_deref().map(parse_initial_date).transpose()?;
        let fork = config.forking.clone().filter(|fork| fork.enabled && !fork.url.is_empty());

        Ok(Self {
            hardfork: config.hardfork,
            chain_id: config.chain_id,
            network_id: config.network_id,
            block_gas_limit: config.block_gas_limit,
            throw_on_transaction_failures: config.throw_on_transaction_failures,
            throw_on_call_failures: config.throw_on_call_failures,
            allow_unlimited_contract_size: config.allow_unlimited_contract_size,
            initial_date,
            logging_enabled: config.logging_enabled,
            fork,
            accounts,
            paths,
            trace_hooks,
        })
    }
}

/// Parses `initialDate` as RFC 3339, `YYYY-MM-DDTHH:MM:SS` (UTC) or `YYYY-MM-DD` (midnight UTC)
fn parse_initial_date(date: &str) -> ProviderResult<i64> {
    if let Ok(date) = DateTime::parse_from_rfc3339(date) {
        return Ok(date.timestamp());
    }
    if let Ok(date) = NaiveDateTime::parse_from_str(date, "%Y-%m-%dT%H:%M:%S") {
        return Ok(date.and_utc().timestamp());
    }
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|date| date.and_utc().timestamp())
        .ok_or_else(|| ProviderError::InvalidConfig { message: format!("invalid initialDate {date:?}") })
}

/// Starts a local simulated chain and returns the transport talking to it
#[async_trait]
pub trait LocalNodeLauncher: Send + Sync + fmt::Debug {
    async fn launch(&self, options: &LocalNodeOptions) -> ProviderResult<Box<dyn Transport>>;
}

/// Base transport of the local simulated chain
///
/// The node is launched once, on the first call; concurrent first calls wait for the same launch.
/// A failed launch is not cached and the next call tries again.
#[derive(Debug)]
pub struct LocalTransport {
    options: LocalNodeOptions,
    launcher: Arc<dyn LocalNodeLauncher>,
    node: OnceCell<Box<dyn Transport>>,
}

impl LocalTransport {
    pub fn new(options: LocalNodeOptions, launcher: Arc<dyn LocalNodeLauncher>) -> Self {
        Self { options, launcher, node: OnceCell::new() }
    }

    pub fn options(&self) -> &LocalNodeOptions {
        &self.options
    }

    pub fn is_launched(&self) -> bool {
        self.node.initialized()
    }
}

#[async_trait]
impl Transport for LocalTransport {
    async fn send(&self, call: JsonRpcCall) -> ProviderResult<Value> {
        let node = self
            .node
            .get_or_try_init(|| async {
                info!("Launching local simulated chain (chain id {})", self.options.chain_id);
                self.launcher.launch(&self.options).await
            })
            .await?;
        node.send(call).await
    }
}

/// Launches [anvil](https://github.com/foundry-rs/foundry) as the local simulated chain
#[derive(Clone, Debug, Default)]
pub struct AnvilLauncher {
    /// Path of the anvil binary, `anvil` from `PATH` if unset
    pub binary: Option<PathBuf>,
}

impl AnvilLauncher {
    pub fn new(binary: Option<PathBuf>) -> Self {
        Self { binary }
    }

    fn builder(&self, options: &LocalNodeOptions) -> Anvil {
        let mut anvil = Anvil::new().chain_id(options.chain_id);
        if let Some(binary) = &self.binary {
            anvil = anvil.path(binary);
        }
        if let Some(fork) = &options.fork {
            anvil = anvil.fork(fork.url.clone());
            if let Some(block_number) = fork.block_number {
                anvil = anvil.fork_block_number(block_number);
            }
        }

        let mut args = vec![
            "--hardfork".to_string(),
            options.hardfork.to_string().to_lowercase(),
            "--gas-limit".to_string(),
            options.block_gas_limit.to_string(),
        ];
        if options.allow_unlimited_contract_size {
            args.push("--disable-code-size-limit".to_string());
        }
        if let Some(timestamp) = options.initial_date {
            args.push("--timestamp".to_string());
            args.push(timestamp.to_string());
        }
        anvil.args(args)
    }
}

#[async_trait]
impl LocalNodeLauncher for AnvilLauncher {
    async fn launch(&self, options: &LocalNodeOptions) -> ProviderResult<Box<dyn Transport>> {
        let anvil = self.builder(options);

        // `Anvil::spawn` blocks while waiting for the node and panics on failure
        let instance = tokio::task::spawn_blocking(move || anvil.spawn()).await.map_err(|err| {
            ProviderError::LocalNode { message: format!("failed to spawn anvil: {err}") }
        })?;

        let endpoint = instance.endpoint();
        let http = Http::new(endpoint.parse::<reqwest::Url>().map_err(|err| {
            ProviderError::LocalNode { message: format!("invalid anvil endpoint {endpoint}: {err}") }
        })?);
        let transport = AnvilTransport { inner: JsonRpcClientTransport::new(http), instance };
        debug!("Anvil listening on {endpoint}");

        for account in &options.accounts {
            transport
                .send(JsonRpcCall::new(
                    ANVIL_SET_BALANCE,
                    vec![json!(account.private_key.address()), to_quantity(account.balance)],
                ))
                .await?;
        }

        Ok(Box::new(transport))
    }
}

/// Transport to a running anvil, which is killed when this is dropped
struct AnvilTransport {
    inner: JsonRpcClientTransport<Http>,
    instance: AnvilInstance,
}

impl fmt::Debug for AnvilTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnvilTransport").field("endpoint", &self.instance.endpoint()).finish()
    }
}

#[async_trait]
impl Transport for AnvilTransport {
    async fn send(&self, call: JsonRpcCall) -> ProviderResult<Value> {
        self.inner.send(call).await
    }
}
