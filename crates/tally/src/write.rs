//! Wallet-signed, state-changing contract calls.

use crate::connection::SessionView;
use alloy_dyn_abi::DynSolValue;
use alloy_network::ReceiptResponse;
use alloy_primitives::{Address, ChainId, TxHash};
use alloy_provider::{PendingTransactionBuilder, PendingTransactionError, Provider, WatchTxError};
use async_trait::async_trait;
use std::{fmt, time::Duration};
use tally_common::{ContractDescriptor, ControllerError, Mutability, RpcProvider};
use tally_wallets::WalletCall;

/// Identifies a submitted transaction. Holding one does not mean the call took effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TxHandle {
    pub hash: TxHash,
}

impl From<TxHash> for TxHandle {
    fn from(hash: TxHash) -> Self {
        Self { hash }
    }
}

impl fmt::Display for TxHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.hash.fmt(f)
    }
}

/// Outcome of a transaction that was included and applied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfirmationReceipt {
    pub tx_hash: TxHash,
    pub block_number: Option<u64>,
    pub gas_used: u64,
}

/// Submits state-changing calls and waits for them to be final.
#[async_trait]
pub trait WriteClient: Send + Sync {
    /// Has the connected wallet sign `function(args)` and submit it.
    ///
    /// Returns as soon as the network accepted the transaction into its pending pool.
    async fn submit(
        &self,
        contract: &ContractDescriptor,
        function: &str,
        args: &[DynSolValue],
        signer: Option<Address>,
    ) -> Result<TxHandle, ControllerError>;

    /// Waits until `handle` is included and reports whether it applied.
    async fn await_confirmation(
        &self,
        handle: &TxHandle,
    ) -> Result<ConfirmationReceipt, ControllerError>;
}

/// A [`WriteClient`] that signs through the session's wallet and watches receipts over RPC.
#[derive(Clone, Debug)]
pub struct RpcWriteClient {
    provider: RpcProvider,
    session: SessionView,
    chain_id: Option<ChainId>,
    confirmations: u64,
    timeout: Duration,
}

impl RpcWriteClient {
    pub fn new(provider: RpcProvider, session: SessionView) -> Self {
        Self {
            provider,
            session,
            chain_id: None,
            confirmations: 1,
            timeout: Duration::from_secs(120),
        }
    }

    /// The chain id put into every transaction request.
    pub fn with_chain_id(mut self, chain_id: ChainId) -> Self {
        self.chain_id = Some(chain_id);
        self
    }

    /// Number of blocks a transaction must be buried under to count as final.
    pub fn with_confirmations(mut self, confirmations: u64) -> Self {
        self.confirmations = confirmations.max(1);
        self
    }

    /// Upper bound on [`WriteClient::await_confirmation`].
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn watch_error(&self, tx_hash: TxHash, err: PendingTransactionError) -> ControllerError {
        match err {
            PendingTransactionError::TxWatcher(WatchTxError::Timeout) => {
                ControllerError::ConfirmationTimeout { tx_hash, timeout: self.timeout }
            }
            PendingTransactionError::TransportError(err) => ControllerError::from_read_error(err),
            err => ControllerError::NetworkUnavailable(err.to_string()),
        }
    }
}

#[async_trait]
impl WriteClient for RpcWriteClient {
    async fn submit(
        &self,
        contract: &ContractDescriptor,
        function: &str,
        args: &[DynSolValue],
        signer: Option<Address>,
    ) -> Result<TxHandle, ControllerError> {
        let signature = contract.resolve(function, Mutability::StateChanging)?;
        let input = signature.encode_call(args)?;

        let signer = signer.ok_or(ControllerError::NoActiveSession)?;
        match self.session.connected_address() {
            Some(connected) if connected == signer => {}
            _ => return Err(ControllerError::NoActiveSession),
        }
        let wallet = self.session.wallet().ok_or_else(|| {
            ControllerError::ProviderUnavailable("no wallet provider is available".to_string())
        })?;

        let call = WalletCall {
            from: signer,
            to: contract.address(),
            input: input.into(),
            chain_id: self.chain_id,
        };
        debug!(%signer, %signature, "requesting signature");
        let hash = wallet.sign_and_submit(call).await?;
        debug!(%hash, "transaction accepted");
        Ok(TxHandle { hash })
    }

    async fn await_confirmation(
        &self,
        handle: &TxHandle,
    ) -> Result<ConfirmationReceipt, ControllerError> {
        let tx_hash = handle.hash;

        // the transaction may already be mined, e.g. on instant-mining dev nodes
        let mined = if self.confirmations <= 1 {
            self.provider
                .get_transaction_receipt(tx_hash)
                .await
                .map_err(ControllerError::from_read_error)?
        } else {
            None
        };

        let receipt = match mined {
            Some(receipt) => receipt,
            None => {
                trace!(
                    %tx_hash,
                    confirmations = self.confirmations,
                    timeout = ?self.timeout,
                    "watching transaction"
                );
                PendingTransactionBuilder::new(self.provider.root().clone(), tx_hash)
                    .with_required_confirmations(self.confirmations)
                    .with_timeout(Some(self.timeout))
                    .get_receipt()
                    .await
                    .map_err(|err| self.watch_error(tx_hash, err))?
            }
        };

        if !receipt.status() {
            return Err(ControllerError::ExecutionReverted { tx_hash });
        }
        Ok(ConfirmationReceipt {
            tx_hash,
            block_number: receipt.block_number(),
            gas_used: receipt.gas_used(),
        })
    }
}
