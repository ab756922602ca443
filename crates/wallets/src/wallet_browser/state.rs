use alloy_primitives::ChainId;
use parking_lot::Mutex;
use uuid::Uuid;

use crate::wallet_browser::{
    queue::RequestQueue,
    types::{BrowserTransaction, Connection, ConnectionInfo, ConnectionUpdate, TransactionResponse},
};

/// Connection lifecycle as seen by the bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ConnectionStatus {
    Disconnected,
    /// Waiting for the page to report an outcome.
    Requested,
    Connected(Connection),
    Rejected(String),
    Unavailable(String),
}

#[derive(Debug)]
pub(crate) struct BrowserWalletState {
    /// Current information about the wallet connection.
    connection: Mutex<ConnectionStatus>,
    /// Request/response queue for transactions.
    transactions: Mutex<RequestQueue<BrowserTransaction, TransactionResponse>>,
    /// Required in the `X-Session-Token` header of every API call.
    session_token: String,
    /// The chain the wallet is asked to switch to.
    chain_id: Option<ChainId>,
}

impl BrowserWalletState {
    /// Create a new browser wallet state.
    pub fn new(chain_id: Option<ChainId>) -> Self {
        Self {
            connection: Mutex::new(ConnectionStatus::Disconnected),
            transactions: Mutex::new(RequestQueue::new()),
            session_token: Uuid::new_v4().simple().to_string(),
            chain_id,
        }
    }

    pub fn session_token(&self) -> &str {
        &self.session_token
    }

    /// Check if wallet is connected.
    pub fn is_connected(&self) -> bool {
        matches!(*self.connection.lock(), ConnectionStatus::Connected(_))
    }

    /// Get current connection information.
    pub fn get_connection(&self) -> Option<Connection> {
        match *self.connection.lock() {
            ConnectionStatus::Connected(connection) => Some(connection),
            _ => None,
        }
    }

    pub fn connection_status(&self) -> ConnectionStatus {
        self.connection.lock().clone()
    }

    pub fn connection_info(&self) -> ConnectionInfo {
        let status = self.connection.lock();
        ConnectionInfo {
            requested: matches!(*status, ConnectionStatus::Requested),
            chain_id: self.chain_id,
            connection: match *status {
                ConnectionStatus::Connected(connection) => Some(connection),
                _ => None,
            },
        }
    }

    /// Asks the page to connect, forgetting any earlier outcome.
    pub fn request_connection(&self) {
        *self.connection.lock() = ConnectionStatus::Requested;
    }

    /// Applies an update posted by the page.
    pub fn update_connection(&self, update: ConnectionUpdate) {
        *self.connection.lock() = match update {
            ConnectionUpdate::Connected { connection } => ConnectionStatus::Connected(connection),
            ConnectionUpdate::Disconnected => ConnectionStatus::Disconnected,
            ConnectionUpdate::Rejected { reason } => ConnectionStatus::Rejected(reason),
            ConnectionUpdate::Unavailable { reason } => ConnectionStatus::Unavailable(reason),
        };
    }

    /// Add a transaction request.
    pub fn add_transaction_request(&self, request: BrowserTransaction) {
        self.transactions.lock().add_request(request);
    }

    /// Check if a transaction request exists.
    pub fn has_transaction_request(&self, id: &Uuid) -> bool {
        self.transactions.lock().has_request(id)
    }

    /// Read the next transaction request.
    pub fn read_next_transaction_request(&self) -> Option<BrowserTransaction> {
        self.transactions.lock().read_request().cloned()
    }

    // Remove a transaction request.
    pub fn remove_transaction_request(&self, id: &Uuid) {
        self.transactions.lock().remove_request(id);
    }

    /// Add transaction response.
    pub fn add_transaction_response(&self, response: TransactionResponse) {
        let id = response.id;
        let mut transactions = self.transactions.lock();
        transactions.add_response(id, response);
        transactions.remove_request(&id);
    }

    /// Get transaction response, removing it from the queue.
    pub fn get_transaction_response(&self, id: &Uuid) -> Option<TransactionResponse> {
        self.transactions.lock().get_response(id)
    }
}
