use alloy_json_rpc::RpcError;
use alloy_primitives::hex::FromHexError;
use alloy_transport::TransportError;
use std::time::Duration;
use tally_common::ControllerError;

#[cfg(feature = "browser")]
use crate::wallet_browser::error::BrowserWalletError;

/// EIP-1193 error code for a request the user declined.
pub const USER_REJECTED_CODE: i64 = 4001;

#[derive(Debug, thiserror::Error)]
pub enum PrivateKeyError {
    #[error("Failed to create wallet from private key. Private key is invalid hex: {0}")]
    InvalidHex(#[from] FromHexError),
    #[error(
        "Failed to create wallet from private key. Invalid private key. But env var {0} exists. Is the `$` anchor missing?"
    )]
    ExistsAsEnvVar(String),
}

/// Failures reported by a [`WalletProvider`](crate::WalletProvider).
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum WalletError {
    /// No wallet capability could be reached.
    #[error("wallet unavailable: {0}")]
    Unavailable(String),
    /// The wallet holder declined the request.
    #[error("{operation} rejected: {reason}")]
    Rejected { operation: &'static str, reason: String },
    /// The wallet signed the transaction but the network refused it.
    #[error("transaction refused: {0}")]
    Submission(String),
    /// The node behind the wallet could not be reached.
    #[error("transport error: {0}")]
    Transport(String),
    /// The wallet did not answer in time.
    #[error("timed out after {}s waiting for the wallet", .0.as_secs())]
    Timeout(Duration),
}

impl WalletError {
    /// Classifies an RPC failure returned while talking to a node-backed wallet.
    pub fn from_rpc(operation: &'static str, err: TransportError) -> Self {
        match err {
            RpcError::ErrorResp(payload) if payload.code == USER_REJECTED_CODE => {
                Self::Rejected { operation, reason: payload.message.to_string() }
            }
            RpcError::ErrorResp(payload) => Self::Submission(payload.message.to_string()),
            RpcError::Transport(kind) => Self::Transport(kind.to_string()),
            err => Self::Transport(err.to_string()),
        }
    }
}

impl From<WalletError> for ControllerError {
    fn from(err: WalletError) -> Self {
        match err {
            WalletError::Unavailable(reason) => Self::ProviderUnavailable(reason),
            WalletError::Rejected { operation, reason } => {
                Self::UserRejected(format!("{operation}: {reason}"))
            }
            WalletError::Submission(reason) => Self::SubmissionRejected(reason),
            WalletError::Transport(reason) => Self::NetworkUnavailable(reason),
            err @ WalletError::Timeout(_) => Self::UserRejected(err.to_string()),
        }
    }
}

#[cfg(feature = "browser")]
impl From<BrowserWalletError> for WalletError {
    fn from(err: BrowserWalletError) -> Self {
        match err {
            BrowserWalletError::Rejected { operation, reason } => {
                Self::Rejected { operation, reason }
            }
            BrowserWalletError::Submission(reason) => Self::Submission(reason),
            BrowserWalletError::Timeout(timeout) => Self::Timeout(timeout),
            BrowserWalletError::Unavailable(reason) => Self::Unavailable(reason),
            err @ (BrowserWalletError::NotConnected | BrowserWalletError::Io(_)) => {
                Self::Unavailable(err.to_string())
            }
        }
    }
}
