//! Provider construction constants

/// Networks
pub mod network {
    /// Reserved name of the local simulated network
    pub const LOCAL_NETWORK_NAME: &str = "localnet";
    /// Default chain id of the local simulated network
    pub const LOCAL_CHAIN_ID: u64 = 31337;
    /// Default block gas limit of the local simulated network
    pub const LOCAL_BLOCK_GAS_LIMIT: u64 = 30_000_000;
    /// Default timeout of remote HTTP requests (in milliseconds)
    pub const HTTP_TIMEOUT_MS: u64 = 20_000;
}

/// HD accounts
pub mod accounts {
    /// Default HD derivation path prefix (account index is appended)
    pub const DEFAULT_HD_PATH: &str = "m/44'/60'/0'/0/";
    /// Default index of the first derived account
    pub const DEFAULT_INITIAL_INDEX: u32 = 0;
    /// Default number of derived accounts
    pub const DEFAULT_COUNT: u32 = 10;
    /// Default account balance (10000 ETH, in wei)
    pub const DEFAULT_BALANCE: &str = "10000000000000000000000";
    /// Well-known development mnemonic, never use it with real funds
    pub const TEST_MNEMONIC: &str = "test test test test test test test test test test test junk";
}

/// Gas
pub mod gas {
    /// Default multiplier applied to gas estimations when `gas` is automatic
    pub const DEFAULT_GAS_MULTIPLIER: f64 = 1.0;
    /// Multiplier applied to gas estimations of nodes known to under-estimate
    pub const UNDERESTIMATING_NODE_GAS_MULTIPLIER: f64 = 1.25;
    /// `web3_clientVersion` markers of nodes known to under-estimate gas
    pub const UNDERESTIMATING_CLIENTS: &[&str] = &["ganache"];
    /// Fixed-point precision used for multiplying gas values
    pub const MULTIPLIER_PRECISION: u64 = 1_000_000;
}

/// JSON-RPC method names
pub mod methods {
    pub const ETH_ACCOUNTS: &str = "eth_accounts";
    pub const ETH_REQUEST_ACCOUNTS: &str = "eth_requestAccounts";
    pub const ETH_CALL: &str = "eth_call";
    pub const ETH_CHAIN_ID: &str = "eth_chainId";
    pub const ETH_ESTIMATE_GAS: &str = "eth_estimateGas";
    pub const ETH_GAS_PRICE: &str = "eth_gasPrice";
    pub const ETH_GET_BLOCK_BY_NUMBER: &str = "eth_getBlockByNumber";
    pub const ETH_GET_TRANSACTION_COUNT: &str = "eth_getTransactionCount";
    pub const ETH_SEND_RAW_TRANSACTION: &str = "eth_sendRawTransaction";
    pub const ETH_SEND_TRANSACTION: &str = "eth_sendTransaction";
    pub const ETH_SIGN: &str = "eth_sign";
    pub const ETH_SIGN_TYPED_DATA_V4: &str = "eth_signTypedData_v4";
    pub const NET_VERSION: &str = "net_version";
    pub const PERSONAL_SIGN: &str = "personal_sign";
    pub const WEB3_CLIENT_VERSION: &str = "web3_clientVersion";
    pub const ANVIL_SET_BALANCE: &str = "anvil_setBalance";
}

/// JSON-RPC error codes
pub mod rpc_error_codes {
    pub const INVALID_REQUEST: i64 = -32600;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL_ERROR: i64 = -32603;
    pub const UNAUTHORIZED: i64 = 4100;
    pub const CHAIN_DISCONNECTED: i64 = 4901;
}
