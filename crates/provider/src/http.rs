//! Remote HTTP base transport
use crate::{
    error::{ProviderError, ProviderResult},
    transport::JsonRpcClientTransport,
};
use ethers::providers::Http;
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue},
    Client, Url,
};
use rigging_primitives::{constants::network::HTTP_TIMEOUT_MS, RemoteNetworkConfig};
use std::time::Duration;
use tracing::debug;

pub type HttpTransport = JsonRpcClientTransport<Http>;

/// Builds the HTTP transport of a remote network
///
/// `httpHeaders` become default headers of the underlying client and `timeout` (milliseconds)
/// bounds every request. Header values are never logged since they usually carry credentials.
pub fn http_transport(config: &RemoteNetworkConfig) -> ProviderResult<HttpTransport> {
    let url = Url::parse(&config.url).map_err(|err| ProviderError::InvalidConfig {
        message: format!("invalid url {:?}: {err}", config.url),
    })?;

    let mut headers = HeaderMap::new();
    for (name, value) in &config.http_headers {
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|err| {
            ProviderError::InvalidConfig { message: format!("invalid http header {name:?}: {err}") }
        })?;
        let value = HeaderValue::from_str(value).map_err(|_| ProviderError::InvalidConfig {
            message: format!("invalid value for http header {name:?}"),
        })?;
        headers.insert(name, value);
    }

    let timeout = Duration::from_millis(config.timeout.unwrap_or(HTTP_TIMEOUT_MS));
    let client = Client::builder().default_headers(headers).timeout(timeout).build().map_err(
        |err| ProviderError::InvalidConfig { message: format!("failed to build http client: {err}") },
    )?;

    debug!(
        "HTTP transport for {} (timeout {timeout:?}, {} custom headers)",
        url.host_str().unwrap_or_default(),
        config.http_headers.len()
    );

    Ok(JsonRpcClientTransport::new(Http::new_with_client(url, client)))
}
