//! Commonly used helpers to construct `Provider`s

use crate::{ChainDescriptor, LOCAL_POLL_INTERVAL, REMOTE_POLL_INTERVAL, REQUEST_TIMEOUT};
use alloy_network::Ethereum;
use alloy_provider::{DynProvider, Provider, RootProvider};
use alloy_rpc_client::RpcClient;
use alloy_transport_http::{Http, reqwest};
use eyre::{Result, WrapErr};
use std::time::Duration;
use tally_config::is_local_url;
use url::Url;

/// Helper type alias for the erased provider used by every client.
pub type RpcProvider = DynProvider<Ethereum>;

/// Constructs a provider with a short poll interval if it's a localhost URL (most likely an anvil
/// or other dev node) and a 7 second interval otherwise.
#[inline]
pub fn try_get_http_provider(url: impl AsRef<str>) -> Result<RpcProvider> {
    ProviderBuilder::new(url.as_ref()).build()
}

/// Helper type to construct an [`RpcProvider`].
///
/// No retry layer is installed: a failed request surfaces immediately.
#[derive(Debug)]
pub struct ProviderBuilder {
    // Note: this is a result, so we can easily chain builder calls
    url: Result<Url>,
    timeout: Duration,
    poll_interval: Option<Duration>,
}

impl ProviderBuilder {
    /// Creates a new builder instance
    pub fn new(url_str: &str) -> Self {
        // invalid url: non-prefixed URL scheme is not allowed, so we prepend the default http
        // prefix
        let url_str = if url_str.starts_with("localhost:") || url_str.starts_with("127.0.0.1:") {
            format!("http://{url_str}")
        } else {
            url_str.to_string()
        };

        let url =
            Url::parse(&url_str).wrap_err_with(|| format!("invalid provider URL: {url_str:?}"));

        Self { url, timeout: REQUEST_TIMEOUT, poll_interval: None }
    }

    /// Creates a builder for the chain's primary endpoint.
    pub fn from_chain(chain: &ChainDescriptor) -> Self {
        Self::new(chain.primary_endpoint().as_str())
    }

    /// Sets the request timeout.
    ///
    /// The timeout is applied from when the request starts connecting until the
    /// response body has finished.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the interval used when polling for transaction receipts.
    pub fn poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = Some(poll_interval);
        self
    }

    /// Sets the poll interval if `Some`, otherwise keeps the already-set value.
    pub fn maybe_poll_interval(mut self, poll_interval: Option<Duration>) -> Self {
        self.poll_interval = poll_interval.or(self.poll_interval);
        self
    }

    /// Constructs the provider.
    pub fn build(self) -> Result<RpcProvider> {
        let Self { url, timeout, poll_interval } = self;
        let url = url?;

        match url.scheme() {
            "http" | "https" => {}
            scheme => eyre::bail!("unsupported provider scheme `{scheme}` in {url}"),
        }

        let is_local = is_local_url(url.as_str());
        let poll_interval = poll_interval.unwrap_or(if is_local {
            LOCAL_POLL_INTERVAL
        } else {
            REMOTE_POLL_INTERVAL
        });

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .wrap_err("failed to build http client")?;
        trace!(%url, ?timeout, ?poll_interval, is_local, "building provider");

        let transport = Http::with_client(client, url);
        let client = RpcClient::new(transport, is_local).with_poll_interval(poll_interval);
        Ok(RootProvider::<Ethereum>::new(client).erased())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_localhost() {
        let builder = ProviderBuilder::new("localhost:8545");
        assert_eq!(builder.url.as_ref().unwrap().as_str(), "http://localhost:8545/");
    }

    #[test]
    fn rejects_invalid_urls() {
        let err = ProviderBuilder::new("not a url").build().unwrap_err();
        assert!(err.to_string().contains("invalid provider URL"), "{err}");

        let err = ProviderBuilder::new("ws://127.0.0.1:8546").build().unwrap_err();
        assert!(err.to_string().contains("unsupported provider scheme"), "{err}");
    }

    #[test]
    fn picks_poll_interval_by_locality() {
        let provider = try_get_http_provider("http://127.0.0.1:8545").unwrap();
        assert_eq!(provider.client().poll_interval(), LOCAL_POLL_INTERVAL);

        let provider = try_get_http_provider("https://rpc.sepolia.org").unwrap();
        assert_eq!(provider.client().poll_interval(), REMOTE_POLL_INTERVAL);

        let provider = ProviderBuilder::new("https://rpc.sepolia.org")
            .maybe_poll_interval(Some(Duration::from_secs(1)))
            .maybe_poll_interval(None)
            .build()
            .unwrap();
        assert_eq!(provider.client().poll_interval(), Duration::from_secs(1));
    }
}
