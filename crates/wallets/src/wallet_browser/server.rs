use std::{future::Future, net::Ipv4Addr, sync::Arc, time::Duration};

use alloy_primitives::{ChainId, TxHash};
use parking_lot::Mutex;
use tokio::{net::TcpListener, sync::oneshot};

use crate::{
    USER_REJECTED_CODE,
    wallet_browser::{
        error::BrowserWalletError,
        router::build_router,
        state::{BrowserWalletState, ConnectionStatus},
        types::{BrowserTransaction, Connection, TransactionResponse},
    },
};

/// How often pending requests are checked for an answer from the page.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Local HTTP bridge between tally and a wallet injected into a browser page.
#[derive(Debug, Clone)]
pub struct BrowserWalletServer {
    port: u16,
    timeout: Duration,
    state: Arc<BrowserWalletState>,
    shutdown: Arc<Mutex<Option<oneshot::Sender<()>>>>,
}

impl BrowserWalletServer {
    /// Creates a server for `port` (0 picks a free one). `timeout` bounds every wait on the
    /// wallet holder.
    pub fn new(port: u16, timeout: Duration) -> Self {
        Self::with_chain_id(port, timeout, None)
    }

    /// Like [`Self::new`], asking the wallet to switch to `chain_id` before sending.
    pub fn with_chain_id(port: u16, timeout: Duration, chain_id: Option<ChainId>) -> Self {
        Self {
            port,
            timeout,
            state: Arc::new(BrowserWalletState::new(chain_id)),
            shutdown: Arc::new(Mutex::new(None)),
        }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// The page the user opens to connect their wallet.
    pub fn url(&self) -> String {
        format!("http://127.0.0.1:{}/", self.port)
    }

    pub fn session_token(&self) -> &str {
        self.state.session_token()
    }

    pub fn is_connected(&self) -> bool {
        self.state.is_connected()
    }

    pub fn get_connection(&self) -> Option<Connection> {
        self.state.get_connection()
    }

    /// Binds the listener and serves the page and API in the background.
    pub async fn start(&mut self) -> Result<(), BrowserWalletError> {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, self.port)).await?;
        self.port = listener.local_addr()?.port();

        let router = build_router(self.state.clone());
        let (tx, rx) = oneshot::channel::<()>();
        tokio::spawn(async move {
            let server = axum::serve(listener, router).with_graceful_shutdown(async move {
                let _ = rx.await;
            });
            if let Err(err) = server.await {
                error!(%err, "browser wallet server failed");
            }
        });
        *self.shutdown.lock() = Some(tx);

        info!(url = %self.url(), "browser wallet server started");
        Ok(())
    }

    /// Stops serving. Pending waits run into their timeout.
    pub async fn stop(&mut self) -> Result<(), BrowserWalletError> {
        if let Some(tx) = self.shutdown.lock().take() {
            let _ = tx.send(());
            debug!(port = self.port, "browser wallet server stopped");
        }
        Ok(())
    }

    /// Asks the page to connect and waits for the outcome.
    ///
    /// Returns the existing connection without prompting if there is one.
    pub async fn wait_for_connection(&self) -> Result<Connection, BrowserWalletError> {
        if let Some(connection) = self.get_connection() {
            return Ok(connection);
        }
        self.state.request_connection();

        let state = self.state.clone();
        self.poll(move || match state.connection_status() {
            ConnectionStatus::Connected(connection) => Some(Ok(connection)),
            ConnectionStatus::Rejected(reason) => {
                Some(Err(BrowserWalletError::Rejected { operation: "Connection", reason }))
            }
            ConnectionStatus::Unavailable(reason) => {
                Some(Err(BrowserWalletError::Unavailable(reason)))
            }
            ConnectionStatus::Disconnected | ConnectionStatus::Requested => None,
        })
        .await?
    }

    /// Queues `tx` for the page and waits until the wallet sent or refused it.
    pub async fn request_transaction(
        &self,
        tx: BrowserTransaction,
    ) -> Result<TxHash, BrowserWalletError> {
        if !self.is_connected() {
            return Err(BrowserWalletError::NotConnected);
        }

        let id = tx.id;
        self.state.add_transaction_request(tx);
        debug!(%id, "queued browser transaction");

        let state = self.state.clone();
        let response = match self.poll(move || state.get_transaction_response(&id)).await {
            Ok(response) => response,
            Err(err) => {
                self.state.remove_transaction_request(&id);
                return Err(err);
            }
        };

        match response {
            TransactionResponse { hash: Some(hash), .. } => Ok(hash),
            TransactionResponse { error, code: None | Some(USER_REJECTED_CODE), .. } => {
                Err(BrowserWalletError::Rejected {
                    operation: "Transaction",
                    reason: error.unwrap_or_else(|| "no reason given".to_string()),
                })
            }
            TransactionResponse { error, code: Some(code), .. } => {
                Err(BrowserWalletError::Submission(format!(
                    "{} (code {code})",
                    error.as_deref().unwrap_or("wallet error")
                )))
            }
        }
    }

    /// Polls `check` until it yields a value or the timeout expires.
    fn poll<T>(
        &self,
        mut check: impl FnMut() -> Option<T> + Send,
    ) -> impl Future<Output = Result<T, BrowserWalletError>> + Send
    where
        T: Send,
    {
        let timeout = self.timeout;
        async move {
            let wait = async {
                loop {
                    if let Some(value) = check() {
                        return value;
                    }
                    tokio::time::sleep(POLL_INTERVAL).await;
                }
            };
            tokio::time::timeout(timeout, wait)
                .await
                .map_err(|_| BrowserWalletError::Timeout(timeout))
        }
    }
}
