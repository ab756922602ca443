use alloy_primitives::{Address, ChainId, TxHash};
use alloy_rpc_types::TransactionRequest;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::wallet_browser::queue::Queued;

/// An account the browser wallet connected with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub address: Address,
    pub chain_id: ChainId,
}

impl Connection {
    pub fn new(address: Address, chain_id: ChainId) -> Self {
        Self { address, chain_id }
    }
}

/// Connection outcome reported by the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ConnectionUpdate {
    Connected {
        #[serde(flatten)]
        connection: Connection,
    },
    Disconnected,
    Rejected {
        reason: String,
    },
    /// `window.ethereum` is missing.
    Unavailable {
        reason: String,
    },
}

/// What the page needs to know to drive the wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionInfo {
    /// Set while tally is waiting for the user to connect.
    pub requested: bool,
    /// The chain the wallet should be switched to.
    pub chain_id: Option<ChainId>,
    pub connection: Option<Connection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserTransaction {
    pub id: Uuid,
    #[serde(flatten)]
    pub request: TransactionRequest,
}

impl Queued for BrowserTransaction {
    fn id(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionResponse {
    pub id: Uuid,
    pub hash: Option<TxHash>,
    pub error: Option<String>,
    /// EIP-1193 error code, when the wallet returned one.
    #[serde(default)]
    pub code: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", content = "data", rename_all = "lowercase")]
pub enum BrowserApiResponse<T> {
    Ok(T),
    Error { message: String },
}

impl<T> BrowserApiResponse<T> {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error { message: message.into() }
    }
}
