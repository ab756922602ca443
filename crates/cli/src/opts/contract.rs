use clap::{Parser, ValueHint};
use serde::Serialize;
use std::path::PathBuf;
use tally_config::figment::{
    self, Metadata, Profile,
    value::{Dict, Map},
};

/// Which contract to talk to, and how long to wait for its transactions.
#[derive(Clone, Debug, Default, Serialize, Parser)]
#[command(next_help_heading = "Contract options")]
pub struct ContractOpts {
    /// The address of the counter contract.
    #[arg(long, short = 'c', value_name = "ADDRESS")]
    #[serde(rename = "contract_address", skip_serializing_if = "Option::is_none")]
    pub contract: Option<String>,

    /// A JSON ABI describing the contract, instead of the bundled counter ABI.
    #[arg(long, value_name = "PATH", value_hint = ValueHint::FilePath)]
    #[serde(rename = "abi_path", skip_serializing_if = "Option::is_none")]
    pub abi: Option<PathBuf>,

    /// Number of confirmations to wait for.
    #[arg(long, value_name = "N")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmations: Option<u64>,

    /// How long to wait for a transaction to confirm, in seconds.
    #[arg(long, value_name = "SECONDS")]
    #[serde(rename = "confirmation_timeout", skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

impl figment::Provider for ContractOpts {
    fn metadata(&self) -> Metadata {
        Metadata::named("ContractOpts")
    }

    fn data(&self) -> Result<Map<Profile, Dict>, figment::Error> {
        Ok(Map::from([(Profile::Global, self.dict())]))
    }
}

impl ContractOpts {
    pub fn dict(&self) -> Dict {
        let mut dict = Dict::new();
        if let Some(contract) = &self.contract {
            dict.insert("contract_address".into(), contract.clone().into());
        }
        if let Some(abi) = &self.abi {
            dict.insert("abi_path".into(), abi.display().to_string().into());
        }
        if let Some(confirmations) = self.confirmations {
            dict.insert("confirmations".into(), confirmations.into());
        }
        if let Some(timeout) = self.timeout {
            dict.insert("confirmation_timeout".into(), timeout.into());
        }
        dict
    }
}
