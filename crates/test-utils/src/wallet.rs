use crate::Gate;
use alloy_primitives::{Address, TxHash};
use async_trait::async_trait;
use parking_lot::Mutex;
use tally_wallets::{WalletCall, WalletError, WalletProvider};

/// An in-memory [`WalletProvider`] that records what it was asked to do.
///
/// Submitted transactions get hashes `0x..01`, `0x..02`, ...
#[derive(Debug)]
pub struct MockWallet {
    accounts: Result<Vec<Address>, WalletError>,
    reject_transactions: bool,
    connect_gate: Option<Gate>,
    state: Mutex<State>,
}

#[derive(Debug, Default)]
struct State {
    address_requests: usize,
    calls: Vec<WalletCall>,
    hashes: Vec<TxHash>,
}

impl MockWallet {
    /// A wallet exposing a single account.
    pub fn new(account: Address) -> Self {
        Self::with_accounts(vec![account])
    }

    pub fn with_accounts(accounts: Vec<Address>) -> Self {
        Self {
            accounts: Ok(accounts),
            reject_transactions: false,
            connect_gate: None,
            state: Mutex::default(),
        }
    }

    /// A wallet whose holder declines the connection request.
    pub fn rejecting_connection() -> Self {
        Self {
            accounts: Err(WalletError::Rejected {
                operation: "Connection",
                reason: "User rejected the request.".to_string(),
            }),
            ..Self::with_accounts(vec![])
        }
    }

    /// A wallet that cannot be reached at all.
    pub fn unavailable() -> Self {
        Self {
            accounts: Err(WalletError::Unavailable("no injected provider".to_string())),
            ..Self::with_accounts(vec![])
        }
    }

    /// Declines every transaction.
    pub fn rejecting_transactions(mut self) -> Self {
        self.reject_transactions = true;
        self
    }

    /// Holds account requests back until `gate` lets them through.
    pub fn gated(mut self, gate: &Gate) -> Self {
        self.connect_gate = Some(gate.clone());
        self
    }

    /// Number of times the wallet was asked for accounts.
    pub fn address_requests(&self) -> usize {
        self.state.lock().address_requests
    }

    /// Every call the wallet was asked to sign, including declined ones.
    pub fn calls(&self) -> Vec<WalletCall> {
        self.state.lock().calls.clone()
    }

    /// Number of transactions the wallet was asked to sign.
    pub fn submit_count(&self) -> usize {
        self.state.lock().calls.len()
    }

    /// Hash of the last transaction that was submitted.
    pub fn last_hash(&self) -> Option<TxHash> {
        self.state.lock().hashes.last().copied()
    }
}

#[async_trait]
impl WalletProvider for MockWallet {
    async fn request_addresses(&self) -> Result<Vec<Address>, WalletError> {
        self.state.lock().address_requests += 1;
        if let Some(gate) = &self.connect_gate {
            gate.pass().await;
        }
        self.accounts.clone()
    }

    async fn sign_and_submit(&self, call: WalletCall) -> Result<TxHash, WalletError> {
        let mut state = self.state.lock();
        state.calls.push(call);
        if self.reject_transactions {
            return Err(WalletError::Rejected {
                operation: "Transaction",
                reason: "User denied transaction signature.".to_string(),
            });
        }
        let hash = TxHash::with_last_byte(state.calls.len() as u8);
        state.hashes.push(hash);
        Ok(hash)
    }
}
