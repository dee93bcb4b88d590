//! Hierarchical deterministic key derivation and the [PrivateKey](PrivateKey) secret type
use ethers::{
    prelude::k256::ecdsa::SigningKey,
    signers::{coins_bip39::English, LocalWallet, MnemonicBuilder},
    types::Address,
    utils::{hex, keccak256, secret_key_to_address},
};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Deserializer};
use std::{fmt, str::FromStr};
use thiserror::Error;
use tracing::debug;

lazy_static! {
    /// `m` followed by any number of `/<index>` segments, each optionally hardened, and an
    /// optional trailing separator
    static ref HD_PATH_REGEX: Regex =
        Regex::new(r"^m(/\d+'?)*/?$").expect("HD path regex should compile");
}

/// Errors raised while turning configured key material into private keys
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeyDerivationError {
    /// The HD path does not match `m(/<index>'?)*`
    #[error("invalid HD path {path:?}")]
    InvalidHdPath { path: String },
    /// An index of the requested range could not be derived
    #[error("cannot derive a private key from {mnemonic} and HD path {path:?}")]
    KeyDerivationFailure { mnemonic: MnemonicRef, path: String },
    /// `initial_index + count` does not fit an account index
    #[error("account index range starting at {initial_index} with {count} accounts overflows")]
    IndexRangeOverflow { initial_index: u32, count: u32 },
    /// The configured private key is not a valid secp256k1 scalar
    #[error("invalid private key: {reason}")]
    InvalidPrivateKey { reason: String },
}

/// Non-secret reference to a mnemonic, safe to put in errors and logs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MnemonicRef {
    /// First four bytes of the keccak256 hash of the phrase
    pub fingerprint: [u8; 4],
    /// Number of words of the phrase
    pub words: usize,
}

impl MnemonicRef {
    pub fn new(mnemonic: &str) -> Self {
        let hash = keccak256(mnemonic.trim().as_bytes());
        Self {
            fingerprint: [hash[0], hash[1], hash[2], hash[3]],
            words: mnemonic.split_whitespace().count(),
        }
    }
}

impl fmt::Display for MnemonicRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mnemonic 0x{} ({} words)", hex::encode(self.fingerprint), self.words)
    }
}

/// A secp256k1 private key
///
/// The key material is zeroed when the value is dropped. `Debug` only shows the derived address,
/// and the type has no `Display` or `Serialize` implementation.
#[derive(Clone, PartialEq, Eq)]
pub struct PrivateKey(SigningKey);

impl PrivateKey {
    /// Parses a private key from its raw 32 bytes
    pub fn from_slice(bytes: &[u8]) -> Result<Self, KeyDerivationError> {
        SigningKey::from_slice(bytes)
            .map(Self)
            .map_err(|err| KeyDerivationError::InvalidPrivateKey { reason: err.to_string() })
    }

    /// Address controlled by this key
    pub fn address(&self) -> Address {
        secret_key_to_address(&self.0)
    }

    /// Borrow the underlying signing key
    pub fn signing_key(&self) -> &SigningKey {
        &self.0
    }

    /// Builds an ethers wallet holding a copy of this key
    pub fn to_wallet(&self) -> LocalWallet {
        LocalWallet::from(self.0.clone())
    }
}

impl From<SigningKey> for PrivateKey {
    fn from(key: SigningKey) -> Self {
        Self(key)
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PrivateKey").field(&self.address()).finish()
    }
}

impl FromStr for PrivateKey {
    type Err = KeyDerivationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s.trim().trim_start_matches("0x")).map_err(|_| {
            KeyDerivationError::InvalidPrivateKey { reason: "not a hexadecimal string".into() }
        })?;
        if bytes.len() != 32 {
            return Err(KeyDerivationError::InvalidPrivateKey {
                reason: format!("expected 32 bytes, got {}", bytes.len()),
            });
        }
        Self::from_slice(&bytes)
    }
}

impl<'de> Deserialize<'de> for PrivateKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Returns true if `path` is a valid HD derivation path
pub fn is_valid_hd_path(path: &str) -> bool {
    HD_PATH_REGEX.is_match(path)
}

/// Derives `count` private keys from `mnemonic`, at `hd_path` + index for every index in
/// `[initial_index, initial_index + count)`
///
/// # Arguments
/// * `mnemonic` - BIP-39 (English) mnemonic phrase
/// * `hd_path` - Derivation path prefix, e.g. `m/44'/60'/0'/0/`
/// * `initial_index` - First account index
/// * `count` - Number of keys to derive
///
/// # Returns
/// * `Vec<PrivateKey>` - Exactly `count` keys, in index order
pub fn derive_private_keys(
    mnemonic: &str,
    hd_path: &str,
    initial_index: u32,
    count: u32,
) -> Result<Vec<PrivateKey>, KeyDerivationError> {
    if !is_valid_hd_path(hd_path) {
        return Err(KeyDerivationError::InvalidHdPath { path: hd_path.to_string() });
    }

    let mut path = hd_path.to_string();
    if !path.ends_with('/') {
        path.push('/');
    }

    let end = initial_index
        .checked_add(count)
        .ok_or(KeyDerivationError::IndexRangeOverflow { initial_index, count })?;

    let builder = MnemonicBuilder::<English>::default().phrase(mnemonic);

    (initial_index..end)
        .map(|index| {
            let failure = || KeyDerivationError::KeyDerivationFailure {
                mnemonic: MnemonicRef::new(mnemonic),
                path: path.clone(),
            };

            let wallet = builder
                .clone()
                .derivation_path(&format!("{path}{index}"))
                .map_err(|err| {
                    debug!("Rejected derivation path {path}{index}: {err}");
                    failure()
                })?
                .build()
                .map_err(|err| {
                    debug!("Key derivation at {path}{index} failed: {err}");
                    failure()
                })?;

            Ok(PrivateKey(wallet.signer().clone()))
        })
        .collect()
}
