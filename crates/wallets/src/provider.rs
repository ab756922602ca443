use crate::WalletError;
use alloy_network::TransactionBuilder;
use alloy_primitives::{Address, Bytes, ChainId, TxHash};
use alloy_rpc_types::TransactionRequest;
use async_trait::async_trait;
use std::fmt;

/// A state-changing contract call, ready to be signed by a wallet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WalletCall {
    /// The account that signs the transaction.
    pub from: Address,
    /// The contract being called.
    pub to: Address,
    /// ABI-encoded calldata.
    pub input: Bytes,
    /// The chain the transaction is meant for, if known.
    pub chain_id: Option<ChainId>,
}

impl WalletCall {
    /// Converts the call into an unsigned transaction request.
    ///
    /// Gas, fees and nonce are left for the wallet to fill.
    pub fn into_request(self) -> TransactionRequest {
        let mut tx = TransactionRequest::default()
            .with_from(self.from)
            .with_to(self.to)
            .with_input(self.input);
        if let Some(chain_id) = self.chain_id {
            tx.set_chain_id(chain_id);
        }
        tx
    }
}

/// The wallet capability consumed by the connection controller and the write client.
///
/// Implementations hold the keys, or talk to something that does.
#[async_trait]
pub trait WalletProvider: Send + Sync + fmt::Debug {
    /// Asks the wallet for the accounts it is willing to use.
    ///
    /// May prompt the wallet holder.
    async fn request_addresses(&self) -> Result<Vec<Address>, WalletError>;

    /// Signs `call` and submits it to the network, returning the transaction hash once the
    /// network accepted it into its pending pool.
    async fn sign_and_submit(&self, call: WalletCall) -> Result<TxHash, WalletError>;
}
