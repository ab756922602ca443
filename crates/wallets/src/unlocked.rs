use crate::{WalletCall, WalletError, WalletProvider};
use alloy_primitives::{Address, TxHash};
use alloy_provider::Provider;
use async_trait::async_trait;
use tally_common::RpcProvider;

/// Uses accounts unlocked on the node itself (`eth_accounts` + `eth_sendTransaction`).
#[derive(Clone, Debug)]
pub struct UnlockedWallet {
    provider: RpcProvider,
    from: Option<Address>,
}

impl UnlockedWallet {
    /// Creates a wallet backed by the node's accounts, optionally pinned to `from`.
    pub fn new(provider: RpcProvider, from: Option<Address>) -> Self {
        Self { provider, from }
    }
}

#[async_trait]
impl WalletProvider for UnlockedWallet {
    async fn request_addresses(&self) -> Result<Vec<Address>, WalletError> {
        let accounts = self
            .provider
            .get_accounts()
            .await
            .map_err(|err| WalletError::from_rpc("Connection", err))?;
        trace!(?accounts, "node accounts");

        match self.from {
            Some(from) if accounts.contains(&from) => Ok(vec![from]),
            Some(from) => {
                Err(WalletError::Unavailable(format!("account {from} is not unlocked on the node")))
            }
            None => Ok(accounts),
        }
    }

    async fn sign_and_submit(&self, call: WalletCall) -> Result<TxHash, WalletError> {
        let pending = self
            .provider
            .send_transaction(call.into_request())
            .await
            .map_err(|err| WalletError::from_rpc("Transaction", err))?;
        Ok(*pending.tx_hash())
    }
}
