//! Normalization of [AccountsConfig](AccountsConfig) into concrete accounts
use crate::{
    config::{default_balance, AccountsConfig, DerivedAccount},
    keys::{derive_private_keys, KeyDerivationError},
};

/// Turns an accounts configuration into a list of accounts with known private keys
///
/// An explicit list is returned as is. HD accounts are derived in index order and funded with
/// `accounts_balance`, or [DEFAULT_BALANCE](crate::constants::accounts::DEFAULT_BALANCE) when it
/// is unset. No network I/O happens here.
pub fn normalize_accounts(
    config: &AccountsConfig,
) -> Result<Vec<DerivedAccount>, KeyDerivationError> {
    match config {
        AccountsConfig::List(accounts) => Ok(accounts.clone()),
        AccountsConfig::Hd(hd) => {
            let balance = hd.accounts_balance.unwrap_or_else(default_balance);
            Ok(derive_private_keys(&hd.mnemonic, &hd.path, hd.initial_index, hd.count)?
                .into_iter()
                .map(|private_key| DerivedAccount { private_key, balance })
                .collect())
        }
    }
}
