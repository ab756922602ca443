//! # tally-config
//!
//! Tally configuration.

#![cfg_attr(not(test), warn(unused_crate_dependencies))]

#[macro_use]
extern crate tracing;

use figment::{
    Error, Figment, Metadata, Profile, Provider,
    providers::{Env, Serialized},
    value::{Dict, Map},
};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};
use url::Url;

pub mod error;
pub use error::ExtractConfigError;

mod providers;
use providers::{TomlFileProvider, UnwrapProfileProvider};

// reexport so cli types can implement `figment::Provider` to merge command line arguments
pub use figment;

/// Tally configuration
///
/// # Defaults
///
/// All configuration values have a default, documented below. [`Config::default()`] targets a
/// local dev node on chain `31337` with the counter contract at its usual deployment address.
///
/// # Provider Details
///
/// `Config` is a Figment [`Provider`] named `Tally Config`, yielding its values for the
/// [`Config::DEFAULT_PROFILE`]. [`Config::figment()`] layers `tally.toml` and `TALLY_` prefixed
/// environment variables on top of it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// The selected profile. Set when the config is extracted from a figment.
    #[serde(skip)]
    pub profile: Profile,

    /// EIP-155 chain id of the target network.
    pub chain_id: u64,
    /// Human readable network name.
    pub chain_name: String,
    /// Name of the native currency.
    pub currency_name: String,
    /// Ticker of the native currency.
    pub currency_symbol: String,
    /// Decimals of the native currency.
    pub currency_decimals: u8,

    /// Primary JSON-RPC endpoint.
    pub rpc_url: String,
    /// Additional endpoints, in order of preference, listed after `rpc_url`.
    #[serde(default)]
    pub rpc_endpoints: Vec<String>,

    /// Address of the deployed counter contract.
    pub contract_address: String,
    /// Optional JSON ABI of the contract. The bundled counter ABI is used when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abi_path: Option<PathBuf>,

    /// Per-request RPC timeout, in seconds.
    pub request_timeout: u64,
    /// How long to wait for a transaction to confirm, in seconds.
    pub confirmation_timeout: u64,
    /// Number of confirmations to wait for.
    pub confirmations: u64,
    /// Poll interval for receipts and blocks, in milliseconds.
    ///
    /// Defaults to a short interval for local endpoints and a conservative one otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poll_interval_ms: Option<u64>,

    /// Port of the local browser wallet bridge. `0` picks a free port.
    pub browser_port: u16,
    /// How long to wait for the browser wallet to respond, in seconds.
    pub browser_timeout: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            profile: Self::DEFAULT_PROFILE,
            chain_id: 31337,
            chain_name: "Localhost 31337".to_string(),
            currency_name: "Ether".to_string(),
            currency_symbol: "ETH".to_string(),
            currency_decimals: 18,
            rpc_url: Self::LOCAL_RPC_URL.to_string(),
            rpc_endpoints: vec![],
            contract_address: "0x71C95911E9a5D330f4D621842EC243EE1343292e".to_string(),
            abi_path: None,
            request_timeout: 45,
            confirmation_timeout: 120,
            confirmations: 1,
            poll_interval_ms: None,
            browser_port: 9545,
            browser_timeout: 300,
        }
    }
}

impl Config {
    /// The default profile: "default"
    pub const DEFAULT_PROFILE: Profile = Profile::Default;

    /// The name of the config file.
    pub const FILE_NAME: &'static str = "tally.toml";

    /// Prefix of the environment variables read by [`Config::figment()`].
    pub const ENV_PREFIX: &'static str = "TALLY_";

    /// Default local RPC endpoint.
    pub const LOCAL_RPC_URL: &'static str = "http://127.0.0.1:8545";

    const LOCAL_POLL_INTERVAL_MS: u64 = 250;
    const REMOTE_POLL_INTERVAL_MS: u64 = 7_000;

    /// Returns the current `Config`
    ///
    /// See [`Config::figment()`] for the sources that are merged.
    pub fn load() -> Result<Self, ExtractConfigError> {
        Self::from_provider(Self::figment())
    }

    /// Extracts a `Config` from the given provider.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use figment::providers::{Format, Toml};
    /// use tally_config::Config;
    ///
    /// // Use tally's default `Figment`, but allow values from `other.toml`
    /// let figment = Config::figment().merge(Toml::file("other.toml").nested());
    /// let config = Config::from_provider(figment)?;
    /// # Ok::<_, tally_config::ExtractConfigError>(())
    /// ```
    pub fn from_provider<T: Provider>(provider: T) -> Result<Self, ExtractConfigError> {
        trace!("load config with provider: {:?}", provider.metadata());
        let figment = Figment::from(provider);
        let mut config = figment.extract::<Self>().map_err(ExtractConfigError::new)?;
        config.profile = figment.profile().clone();
        Ok(config)
    }

    /// Returns the default figment
    ///
    /// The default figment reads from the following sources, in ascending priority order:
    ///
    ///   1. [`Config::default()`]
    ///   2. `tally.toml` _or_ the file named by the `TALLY_CONFIG` environment variable
    ///   3. `TALLY_` prefixed environment variables
    ///
    /// The profile selected is the value set in the `TALLY_PROFILE` environment variable. If it
    /// is not set, it defaults to `default`.
    pub fn figment() -> Figment {
        Self::default().into()
    }

    /// Returns the selected profile.
    ///
    /// If the `TALLY_PROFILE` env variable is not set, this returns the `DEFAULT_PROFILE`.
    pub fn selected_profile() -> Profile {
        Profile::from_env_or("TALLY_PROFILE", Self::DEFAULT_PROFILE)
    }

    /// All configured RPC endpoints, primary first, without duplicates.
    pub fn rpc_urls(&self) -> Vec<&str> {
        let mut urls = vec![self.rpc_url.as_str()];
        for url in &self.rpc_endpoints {
            if !urls.contains(&url.as_str()) {
                urls.push(url);
            }
        }
        urls
    }

    /// Returns the per-request RPC timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    /// Returns the confirmation timeout.
    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_secs(self.confirmation_timeout)
    }

    /// Returns the browser wallet timeout.
    pub fn browser_timeout(&self) -> Duration {
        Duration::from_secs(self.browser_timeout)
    }

    /// Returns the configured poll interval, or a default based on whether the primary endpoint
    /// is a local node.
    pub fn poll_interval(&self) -> Duration {
        let ms = self.poll_interval_ms.unwrap_or_else(|| {
            if is_local_url(&self.rpc_url) {
                Self::LOCAL_POLL_INTERVAL_MS
            } else {
                Self::REMOTE_POLL_INTERVAL_MS
            }
        });
        Duration::from_millis(ms)
    }
}

/// Returns `true` if the URL points at the local machine.
pub fn is_local_url(url: &str) -> bool {
    // `localhost:8545` parses as a url with a `localhost` scheme
    if url.starts_with("localhost:") || url.starts_with("127.0.0.1:") {
        return true;
    }
    Url::parse(url)
        .is_ok_and(|url| matches!(url.host_str(), Some("localhost" | "127.0.0.1" | "[::1]")))
}

impl Provider for Config {
    fn metadata(&self) -> Metadata {
        Metadata::named("Tally Config")
    }

    fn data(&self) -> Result<Map<Profile, Dict>, Error> {
        Serialized::defaults(self).data()
    }

    fn profile(&self) -> Option<Profile> {
        Some(self.profile.clone())
    }
}

impl From<Config> for Figment {
    fn from(c: Config) -> Self {
        let profile = Config::selected_profile();
        let toml = UnwrapProfileProvider::new(
            TomlFileProvider::new(Some("TALLY_CONFIG"), Config::FILE_NAME),
            "profile",
        );
        Self::from(c)
            .merge(toml)
            .merge(
                Env::prefixed(Config::ENV_PREFIX).ignore(&["PROFILE", "CONFIG", "DEBUG"]).global(),
            )
            .select(profile)
    }
}
