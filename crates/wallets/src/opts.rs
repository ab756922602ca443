use crate::{LocalWallet, UnlockedWallet, WalletProvider};
use alloy_primitives::Address;
use clap::Parser;
use eyre::Result;
use std::sync::Arc;
use tally_common::RpcProvider;
use tally_config::Config;

/// Selects the wallet that signs counter transactions.
///
/// Without any of these options there is no wallet: reads work, writes fail.
#[derive(Clone, Debug, Default, Parser)]
#[command(next_help_heading = "Wallet options")]
pub struct WalletOpts {
    /// Sign through a browser wallet, served on a local page.
    #[arg(long, conflicts_with_all = ["private_key", "unlocked"])]
    pub browser: bool,

    /// Port of the local browser wallet page.
    #[arg(long, value_name = "PORT", requires = "browser")]
    pub browser_port: Option<u16>,

    /// Use the provided private key.
    #[arg(long, value_name = "RAW_PRIVATE_KEY", conflicts_with = "unlocked")]
    pub private_key: Option<String>,

    /// Use an account unlocked on the node (`eth_sendTransaction`).
    #[arg(long)]
    pub unlocked: bool,

    /// The account to use with `--unlocked`.
    #[arg(long, short, env = "ETH_FROM", value_name = "ADDRESS")]
    pub from: Option<Address>,
}

impl WalletOpts {
    /// Returns `true` if any wallet was requested.
    pub fn is_set(&self) -> bool {
        self.browser || self.private_key.is_some() || self.unlocked
    }

    /// Builds the selected wallet. `provider` is used by node-backed wallets.
    pub async fn wallet(
        &self,
        config: &Config,
        provider: &RpcProvider,
    ) -> Result<Option<Arc<dyn WalletProvider>>> {
        if let Some(private_key) = &self.private_key {
            let wallet = LocalWallet::from_private_key(private_key, provider.clone())?;
            debug!(address = %wallet.address(), "using local wallet");
            return Ok(Some(Arc::new(wallet)));
        }
        if self.unlocked {
            debug!(from = ?self.from, "using unlocked node account");
            return Ok(Some(Arc::new(UnlockedWallet::new(provider.clone(), self.from))));
        }
        if self.browser {
            return self.browser_wallet(config).await.map(Some);
        }
        debug!("no wallet selected");
        Ok(None)
    }

    #[cfg(feature = "browser")]
    async fn browser_wallet(&self, config: &Config) -> Result<Arc<dyn WalletProvider>> {
        let port = self.browser_port.unwrap_or(config.browser_port);
        let wallet = crate::wallet_browser::BrowserWallet::spawn(
            port,
            config.browser_timeout(),
            Some(config.chain_id),
        )
        .await?;
        Ok(Arc::new(wallet))
    }

    #[cfg(not(feature = "browser"))]
    async fn browser_wallet(&self, _config: &Config) -> Result<Arc<dyn WalletProvider>> {
        eyre::bail!("tally was not built with support for the browser wallet")
    }
}
