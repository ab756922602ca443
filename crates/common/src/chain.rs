//! Static description of the target network.

use crate::errors::DescriptorError;
use serde::{Deserialize, Serialize};
use tally_config::Config;
use url::Url;

/// The chain's native currency, as shown to wallets.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

impl Default for NativeCurrency {
    fn default() -> Self {
        Self { name: "Ether".to_string(), symbol: "ETH".to_string(), decimals: 18 }
    }
}

/// Identifies the network the counter contract lives on.
///
/// Built once at startup and never mutated afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChainDescriptor {
    id: u64,
    display_name: String,
    native_currency: NativeCurrency,
    rpc_endpoints: Vec<Url>,
}

impl ChainDescriptor {
    /// Creates a new descriptor, validating every endpoint.
    ///
    /// At least one endpoint is required.
    pub fn new<I, S>(
        id: u64,
        display_name: impl Into<String>,
        native_currency: NativeCurrency,
        rpc_endpoints: I,
    ) -> Result<Self, DescriptorError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let rpc_endpoints = rpc_endpoints
            .into_iter()
            .map(|url| parse_endpoint(url.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        if rpc_endpoints.is_empty() {
            return Err(DescriptorError::NoEndpoints(id));
        }
        Ok(Self { id, display_name: display_name.into(), native_currency, rpc_endpoints })
    }

    /// Builds the descriptor from the loaded configuration.
    pub fn from_config(config: &Config) -> Result<Self, DescriptorError> {
        Self::new(
            config.chain_id,
            config.chain_name.clone(),
            NativeCurrency {
                name: config.currency_name.clone(),
                symbol: config.currency_symbol.clone(),
                decimals: config.currency_decimals,
            },
            config.rpc_urls(),
        )
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn native_currency(&self) -> &NativeCurrency {
        &self.native_currency
    }

    /// All endpoints in priority order.
    pub fn rpc_endpoints(&self) -> &[Url] {
        &self.rpc_endpoints
    }

    /// The endpoint used for reads and confirmation polling.
    pub fn primary_endpoint(&self) -> &Url {
        // `new` guarantees at least one endpoint
        &self.rpc_endpoints[0]
    }
}

/// Parses an RPC endpoint, accepting the scheme-less `localhost:8545` shorthand.
pub fn parse_endpoint(url: &str) -> Result<Url, DescriptorError> {
    let url = url.trim();
    let normalized = if url.starts_with("localhost:") || url.starts_with("127.0.0.1:") {
        format!("http://{url}")
    } else {
        url.to_string()
    };
    let parsed = Url::parse(&normalized).map_err(|err| DescriptorError::InvalidEndpoint {
        url: url.to_string(),
        reason: err.to_string(),
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        scheme => Err(DescriptorError::InvalidEndpoint {
            url: url.to_string(),
            reason: format!("unsupported scheme `{scheme}`, expected http or https"),
        }),
    }
}
