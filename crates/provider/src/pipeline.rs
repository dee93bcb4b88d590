//! Provider pipeline construction
use crate::{
    client::Client,
    error::{ProviderError, ProviderResult},
    http::http_transport,
    legacy::LegacyAdapter,
    local::{AnvilLauncher, LocalNodeLauncher, LocalNodeOptions, LocalTransport, MessageTraceHook},
    middleware::{
        ChainIdValidation, GasLimitDefaulting, GasLimitStrategy, GasMultiplier,
        GasPriceDefaulting, GasPriceStrategy, SenderDefaulting, SenderStrategy, Signing,
        UnknownSenderPolicy,
    },
    transport::Transport,
};
use rigging_primitives::{
    constants::{gas::UNDERESTIMATING_NODE_GAS_MULTIPLIER, network::LOCAL_NETWORK_NAME},
    normalize_accounts, DerivedAccount, GasConfig, GasPriceConfig, NetworkConfig, ProjectPaths,
    RemoteNetworkConfig,
};
use std::sync::Arc;
use tracing::{debug, info};

/// Everything a pipeline is built from besides the network itself
#[derive(Clone, Debug, Default)]
pub struct BuildOptions {
    /// Forwarded to the local simulated chain
    pub paths: Option<ProjectPaths>,
    /// Forwarded to the local simulated chain
    pub trace_hooks: Vec<Arc<dyn MessageTraceHook>>,
    /// Launcher of the local simulated chain, [AnvilLauncher] if unset
    pub local_node: Option<Arc<dyn LocalNodeLauncher>>,
    pub unknown_sender: UnknownSenderPolicy,
}

/// Picks the base transport of a network
///
/// The reserved local network name requires a local configuration and every other name a remote
/// one. Nothing is launched or connected here.
pub fn select_base_transport(
    name: &str,
    config: &NetworkConfig,
    accounts: &[DerivedAccount],
    options: &BuildOptions,
) -> ProviderResult<Box<dyn Transport>> {
    match (name == LOCAL_NETWORK_NAME, config) {
        (true, NetworkConfig::Local(local)) => {
            let node_options = LocalNodeOptions::new(
                local,
                accounts.to_vec(),
                options.paths.clone(),
                options.trace_hooks.clone(),
            )?;
            let launcher = options
                .local_node
                .clone()
                .unwrap_or_else(|| Arc::new(AnvilLauncher::default()));
            Ok(Box::new(LocalTransport::new(node_options, launcher)))
        }
        (false, NetworkConfig::Remote(remote)) => Ok(Box::new(http_transport(remote)?)),
        (true, _) => Err(ProviderError::NetworkMismatch { name: name.into(), expected: "local" }),
        (false, _) => Err(ProviderError::NetworkMismatch { name: name.into(), expected: "remote" }),
    }
}

/// Wraps `base` with the decorators `config` asks for
///
/// From the outside in: chain id validation (remote networks with a chain id), gas price, gas
/// limit, sender, gas multiplier (remote networks without a fixed gas limit) and signing
/// (networks with configured accounts).
pub fn apply_provider_wrappers(
    base: Box<dyn Transport>,
    config: &NetworkConfig,
    unknown_sender: UnknownSenderPolicy,
) -> ProviderResult<Box<dyn Transport>> {
    let accounts = config.accounts().map(normalize_accounts).transpose()?;
    wrap(base, config, accounts.as_deref(), unknown_sender)
}

fn wrap(
    base: Box<dyn Transport>,
    config: &NetworkConfig,
    accounts: Option<&[DerivedAccount]>,
    unknown_sender: UnknownSenderPolicy,
) -> ProviderResult<Box<dyn Transport>> {
    let mut transport = base;

    if let Some(accounts) = accounts {
        debug!("Signing locally for {} accounts", accounts.len());
        transport = Box::new(Signing::new(
            transport,
            accounts.iter().map(|account| &account.private_key),
            unknown_sender,
        ));
    }

    if config.is_remote() && matches!(config.gas(), GasConfig::Auto(_)) {
        transport = Box::new(GasMultiplier::new(transport, UNDERESTIMATING_NODE_GAS_MULTIPLIER)?);
    }

    let sender = config.from().map_or(SenderStrategy::Automatic, SenderStrategy::Fixed);
    transport = Box::new(SenderDefaulting::new(transport, sender));

    let gas = match *config.gas() {
        GasConfig::Fixed(gas) => GasLimitStrategy::Fixed(gas),
        GasConfig::Auto(multiplier) => GasLimitStrategy::Automatic { multiplier },
    };
    transport = Box::new(GasLimitDefaulting::new(transport, gas)?);

    let gas_price = match *config.gas_price() {
        GasPriceConfig::Fixed(gas_price) => GasPriceStrategy::Fixed(gas_price),
        GasPriceConfig::Auto => GasPriceStrategy::Automatic,
    };
    transport = Box::new(GasPriceDefaulting::new(transport, gas_price));

    if let NetworkConfig::Remote(RemoteNetworkConfig { chain_id: Some(chain_id), .. }) = config {
        transport = Box::new(ChainIdValidation::new(transport, *chain_id));
    }

    Ok(transport)
}

/// Builds the full provider pipeline of network `name`
///
/// Accounts are normalized once and shared by the local chain and the signing decorator.
/// Configuration errors surface here; no network I/O happens until the first call.
pub fn build_provider(
    name: &str,
    config: &NetworkConfig,
    options: &BuildOptions,
) -> ProviderResult<Client> {
    info!("Building provider for network {name}");

    let accounts = config.accounts().map(normalize_accounts).transpose()?;
    let base =
        select_base_transport(name, config, accounts.as_deref().unwrap_or_default(), options)?;
    let transport = wrap(base, config, accounts.as_deref(), options.unknown_sender)?;

    Ok(Client::from(transport))
}

/// [build_provider] behind the [LegacyAdapter] surface
pub fn create_provider(
    name: &str,
    config: &NetworkConfig,
    options: &BuildOptions,
) -> ProviderResult<LegacyAdapter> {
    build_provider(name, config, options).map(LegacyAdapter::new)
}
