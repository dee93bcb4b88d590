use ethers::types::{Address, U256};
use serde_json::Value;
use std::str::FromStr;

/// Parses address from string
pub fn parse_address(s: &str) -> Result<Address, String> {
    Address::from_str(s).map_err(|_| format!("String {s} is not a valid address"))
}

/// Parses U256 from decimal string
pub fn parse_u256(s: &str) -> Result<U256, String> {
    U256::from_dec_str(s).map_err(|_| format!("String {s} is not a valid U256"))
}

/// Parses `Name: value` HTTP header
pub fn parse_header(header: &str) -> Result<(String, String), String> {
    let (name, value) = header
        .split_once(':')
        .ok_or_else(|| format!("Header {header:?} is not a valid Name: value pair"))?;
    Ok((name.trim().to_string(), value.trim().to_string()))
}

/// Parses JSON-RPC params: an array is taken as the params list, any other value as the only param
pub fn parse_params(params: &str) -> Result<Vec<Value>, String> {
    match serde_json::from_str(params).map_err(|err| format!("Params are not valid JSON: {err}"))? {
        Value::Array(params) => Ok(params),
        param => Ok(vec![param]),
    }
}
