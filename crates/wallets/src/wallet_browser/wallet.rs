use alloy_primitives::{Address, ChainId, TxHash};
use async_trait::async_trait;
use std::time::Duration;
use uuid::Uuid;

use crate::{
    WalletCall, WalletError, WalletProvider,
    wallet_browser::{
        error::BrowserWalletError, server::BrowserWalletServer, types::BrowserTransaction,
    },
};

/// A wallet injected into a browser page (EIP-1193), reached through [`BrowserWalletServer`].
#[derive(Clone, Debug)]
pub struct BrowserWallet {
    server: BrowserWalletServer,
}

impl BrowserWallet {
    /// Starts the bridge on `port` and returns once it is listening.
    pub async fn spawn(
        port: u16,
        timeout: Duration,
        chain_id: Option<ChainId>,
    ) -> Result<Self, BrowserWalletError> {
        let mut server = BrowserWalletServer::with_chain_id(port, timeout, chain_id);
        server.start().await?;
        Ok(Self { server })
    }

    pub fn server(&self) -> &BrowserWalletServer {
        &self.server
    }
}

#[async_trait]
impl WalletProvider for BrowserWallet {
    async fn request_addresses(&self) -> Result<Vec<Address>, WalletError> {
        if !self.server.is_connected() {
            info!(url = %self.server.url(), "open the page to connect your wallet");
        }
        let connection = self.server.wait_for_connection().await?;
        Ok(vec![connection.address])
    }

    async fn sign_and_submit(&self, call: WalletCall) -> Result<TxHash, WalletError> {
        let connection = self.server.get_connection().ok_or(BrowserWalletError::NotConnected)?;
        if connection.address != call.from {
            return Err(WalletError::Rejected {
                operation: "Transaction",
                reason: format!(
                    "browser wallet is connected as {}, not {}",
                    connection.address, call.from
                ),
            });
        }

        let tx = BrowserTransaction { id: Uuid::new_v4(), request: call.into_request() };
        info!(url = %self.server.url(), id = %tx.id, "confirm the transaction in your wallet");
        Ok(self.server.request_transaction(tx).await?)
    }
}
