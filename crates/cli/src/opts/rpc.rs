use crate::opts::ContractOpts;
use clap::Parser;
use eyre::Result;
use serde::Serialize;
use tally_config::{
    Config,
    figment::{
        self, Metadata, Profile,
        value::{Dict, Map},
    },
};
use tally_wallets::WalletOpts;

#[derive(Clone, Debug, Default, Serialize, Parser)]
pub struct RpcOpts {
    /// The RPC endpoint.
    #[arg(short = 'r', long = "rpc-url", env = "ETH_RPC_URL", value_name = "URL")]
    #[serde(rename = "rpc_url", skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// The EIP-155 chain id the contract lives on.
    #[arg(long, value_name = "CHAIN_ID")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<u64>,

    /// Timeout for the RPC request in seconds.
    #[arg(long, env = "ETH_RPC_TIMEOUT", value_name = "SECONDS")]
    #[serde(rename = "request_timeout", skip_serializing_if = "Option::is_none")]
    pub rpc_timeout: Option<u64>,
}

impl figment::Provider for RpcOpts {
    fn metadata(&self) -> Metadata {
        Metadata::named("RpcOpts")
    }

    // global, like the `TALLY_*` env layer, so flags merged after it win
    fn data(&self) -> Result<Map<Profile, Dict>, figment::Error> {
        Ok(Map::from([(Profile::Global, self.dict())]))
    }
}

impl RpcOpts {
    pub fn dict(&self) -> Dict {
        let mut dict = Dict::new();
        if let Some(url) = &self.url {
            dict.insert("rpc_url".into(), url.clone().into());
        }
        if let Some(chain_id) = self.chain_id {
            dict.insert("chain_id".into(), chain_id.into());
        }
        if let Some(rpc_timeout) = self.rpc_timeout {
            dict.insert("request_timeout".into(), rpc_timeout.into());
        }
        dict
    }
}

#[derive(Clone, Debug, Default, Parser)]
#[command(next_help_heading = "Ethereum options")]
pub struct EthereumOpts {
    #[command(flatten)]
    pub rpc: RpcOpts,

    #[command(flatten)]
    pub contract: ContractOpts,

    #[command(flatten)]
    pub wallet: WalletOpts,
}

// Make this args a `Figment` so that it can be merged into the `Config`
impl figment::Provider for EthereumOpts {
    fn metadata(&self) -> Metadata {
        Metadata::named("Ethereum Opts Provider")
    }

    fn data(&self) -> Result<Map<Profile, Dict>, figment::Error> {
        let mut dict = self.rpc.dict();
        dict.extend(self.contract.dict());
        Ok(Map::from([(Profile::Global, dict)]))
    }
}

impl EthereumOpts {
    /// Loads the [`Config`] with these options layered on top.
    pub fn load_config(&self) -> Result<Config> {
        crate::utils::load_config_with(self.clone())
    }
}
