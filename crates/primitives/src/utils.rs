//! Misc utils

use ethers::types::U256;
use serde::{de, Deserialize, Deserializer};
use serde_json::Value;

/// Formats a value as a JSON-RPC quantity (`0x`-prefixed, no leading zeros)
pub fn to_quantity(value: U256) -> Value {
    Value::String(format!("{value:#x}"))
}

/// Parses a JSON-RPC quantity
///
/// Accepts `0x`-prefixed hex strings, decimal strings and non-negative JSON integers.
pub fn parse_quantity(value: &Value) -> Option<U256> {
    match value {
        Value::String(s) => parse_u256_str(s),
        Value::Number(n) => n.as_u64().map(U256::from),
        _ => None,
    }
}

fn parse_u256_str(s: &str) -> Option<U256> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        if hex.is_empty() {
            return None;
        }
        U256::from_str_radix(hex, 16).ok()
    } else {
        U256::from_dec_str(s).ok()
    }
}

/// Deserializes U256 from a decimal string, a hex string or a JSON integer
pub fn deserialize_u256<'de, D>(deserializer: D) -> Result<U256, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    parse_quantity(&value)
        .ok_or_else(|| de::Error::custom(format!("{value} is not a valid unsigned integer")))
}

/// Deserializes an optional U256, see [deserialize_u256](deserialize_u256)
pub fn deserialize_u256_opt<'de, D>(deserializer: D) -> Result<Option<U256>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(value) => parse_quantity(&value)
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("{value} is not a valid unsigned integer"))),
    }
}
