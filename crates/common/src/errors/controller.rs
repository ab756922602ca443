use super::DescriptorError;
use alloy_json_rpc::RpcError;
use alloy_primitives::TxHash;
use alloy_transport::TransportError;
use std::time::Duration;

/// Every failure a counter operation can surface.
///
/// Errors are cloneable so the controllers can keep the last one around for display.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ControllerError {
    /// The contract descriptor was misused: unknown function, wrong mutability class or a
    /// signature that doesn't match the expected one.
    #[error("configuration mismatch: {0}")]
    ConfigurationMismatch(String),
    /// No wallet capability is present, or it could not be reached.
    #[error("wallet provider unavailable: {0}")]
    ProviderUnavailable(String),
    /// The wallet holder declined the request.
    #[error("request rejected by the wallet: {0}")]
    UserRejected(String),
    /// A write was attempted without a connected wallet session.
    #[error("no active wallet session")]
    NoActiveSession,
    /// The RPC endpoint could not be reached.
    #[error("network unavailable: {0}")]
    NetworkUnavailable(String),
    /// The returned payload does not match the declared output type.
    #[error("failed to decode response: {0}")]
    DecodingError(String),
    /// The network refused the transaction.
    #[error("transaction rejected by the network: {0}")]
    SubmissionRejected(String),
    /// No terminal status was observed in time. The transaction may still confirm later.
    #[error("transaction {tx_hash} was not confirmed within {}s", .timeout.as_secs())]
    ConfirmationTimeout { tx_hash: TxHash, timeout: Duration },
    /// The transaction was mined but did not apply.
    #[error("transaction {tx_hash} reverted")]
    ExecutionReverted { tx_hash: TxHash },
    /// Caller supplied input that can't be sent.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Another write cycle is still in flight.
    #[error("another operation is already in progress")]
    OperationInProgress,
}

impl ControllerError {
    /// Creates a [`ControllerError::ConfigurationMismatch`] for the given function.
    pub fn mismatch(function: &str, reason: impl std::fmt::Display) -> Self {
        Self::ConfigurationMismatch(format!("`{function}` {reason}"))
    }

    /// Classifies an RPC failure that happened while querying the chain.
    pub fn from_read_error(err: TransportError) -> Self {
        match err {
            RpcError::ErrorResp(payload) => {
                Self::NetworkUnavailable(format!("node returned an error: {payload}"))
            }
            err => Self::from_rpc_error(err),
        }
    }

    /// Classifies an RPC failure that happened while submitting a transaction.
    pub fn from_submit_error(err: TransportError) -> Self {
        match err {
            RpcError::ErrorResp(payload) => Self::SubmissionRejected(payload.message.to_string()),
            err => Self::from_rpc_error(err),
        }
    }

    fn from_rpc_error(err: TransportError) -> Self {
        match err {
            RpcError::Transport(kind) => Self::NetworkUnavailable(kind.to_string()),
            RpcError::DeserError { err, .. } => Self::DecodingError(err.to_string()),
            RpcError::NullResp => Self::DecodingError("null response from node".to_string()),
            err => Self::NetworkUnavailable(err.to_string()),
        }
    }

    /// Returns `true` if retrying the same call later could succeed.
    ///
    /// Nothing retries automatically; this is a hint for presentation layers.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::NetworkUnavailable(_)
                | Self::ConfirmationTimeout { .. }
                | Self::OperationInProgress
        )
    }

    /// What the user can do about this error, if there is something to suggest.
    pub fn hint(&self) -> Option<&'static str> {
        Some(match self {
            Self::ProviderUnavailable(_) => {
                "pick a wallet with `--browser`, `--private-key` or `--unlocked`"
            }
            Self::NoActiveSession => "connect a wallet first",
            Self::NetworkUnavailable(_) => "check that the node at `--rpc-url` is running",
            Self::ConfigurationMismatch(_) => {
                "check `--contract` and `--abi` against the deployed counter"
            }
            Self::ConfirmationTimeout { .. } => {
                "the transaction may still land; run `tally read` later or raise `--timeout`"
            }
            Self::InvalidInput(_) => "values are non-negative integers, decimal or 0x-prefixed",
            Self::OperationInProgress => "wait for the running operation to finish",
            Self::UserRejected(_)
            | Self::DecodingError(_)
            | Self::SubmissionRejected(_)
            | Self::ExecutionReverted { .. } => return None,
        })
    }
}

impl From<DescriptorError> for ControllerError {
    fn from(err: DescriptorError) -> Self {
        Self::ConfigurationMismatch(err.to_string())
    }
}
