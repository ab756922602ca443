//! Wallet connection lifecycle.

use alloy_primitives::Address;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::{fmt, sync::Arc};
use tally_common::ControllerError;
use tally_wallets::WalletProvider;

/// Connection lifecycle states.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected(Address),
}

impl ConnectionState {
    pub fn address(&self) -> Option<Address> {
        match self {
            Self::Connected(address) => Some(*address),
            _ => None,
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => f.write_str("disconnected"),
            Self::Connecting => f.write_str("connecting"),
            Self::Connected(address) => write!(f, "connected as {address}"),
        }
    }
}

/// The wallet session shared with the write path.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct WalletSession {
    pub connected_address: Option<Address>,
}

type StateObserver = Box<dyn Fn(ConnectionState) + Send + Sync>;

struct Shared {
    state: RwLock<ConnectionState>,
    /// Run in order on every transition, with the state lock held.
    observers: Mutex<Vec<StateObserver>>,
    wallet: Option<Arc<dyn WalletProvider>>,
    /// Serializes concurrent connection attempts so the wallet is prompted once.
    connecting: tokio::sync::Mutex<()>,
}

/// Owns the wallet session. It is the only component that changes it.
///
/// Every fresh controller starts [`ConnectionState::Disconnected`]; nothing is persisted.
#[derive(Clone)]
pub struct ConnectionController {
    shared: Arc<Shared>,
}

impl fmt::Debug for ConnectionController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionController")
            .field("state", &self.state())
            .field("wallet", &self.shared.wallet)
            .finish()
    }
}

impl ConnectionController {
    /// Creates a controller for `wallet`. `None` means no wallet capability is present, so every
    /// connection attempt fails with [`ControllerError::ProviderUnavailable`].
    pub fn new(wallet: Option<Arc<dyn WalletProvider>>) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: RwLock::new(ConnectionState::Disconnected),
                observers: Mutex::new(Vec::new()),
                wallet,
                connecting: tokio::sync::Mutex::new(()),
            }),
        }
    }

    pub fn state(&self) -> ConnectionState {
        *self.shared.state.read()
    }

    pub fn session(&self) -> WalletSession {
        WalletSession { connected_address: self.state().address() }
    }

    /// Calls `observer` with the current state now and with every later transition.
    ///
    /// The observer runs with the state lock held and must not call back into this controller.
    pub fn observe(&self, observer: impl Fn(ConnectionState) + Send + Sync + 'static) {
        let state = self.shared.state.write();
        observer(*state);
        self.shared.observers.lock().push(Box::new(observer));
    }

    /// A read-only handle on the session, for the write client.
    pub fn session_view(&self) -> SessionView {
        SessionView { shared: self.shared.clone() }
    }

    /// Asks the wallet for an account.
    ///
    /// A no-op returning the current address when already connected. On failure the state goes
    /// back to [`ConnectionState::Disconnected`].
    pub async fn request_connection(&self) -> Result<Address, ControllerError> {
        if let Some(address) = self.state().address() {
            return Ok(address);
        }
        let Some(wallet) = self.shared.wallet.clone() else {
            return Err(ControllerError::ProviderUnavailable(
                "no wallet provider is available".to_string(),
            ));
        };

        let _lock = self.shared.connecting.lock().await;
        // another caller may have connected while we waited
        if let Some(address) = self.state().address() {
            return Ok(address);
        }

        self.set_state(ConnectionState::Connecting);
        let _attempt = ConnectAttempt { shared: &self.shared };

        let result = match wallet.request_addresses().await {
            Ok(addresses) => match addresses.first() {
                Some(&address) => Ok(address),
                None => Err(ControllerError::UserRejected(
                    "the wallet did not expose any account".to_string(),
                )),
            },
            Err(err) => Err(err.into()),
        };

        match result {
            Ok(address) => {
                self.set_state(ConnectionState::Connected(address));
                Ok(address)
            }
            Err(err) => {
                debug!(%err, "connection failed");
                Err(err)
            }
        }
    }

    fn set_state(&self, state: ConnectionState) {
        self.shared.transition(|_| Some(state));
    }
}

impl Shared {
    /// Moves to the state `f` picks, if any, and tells the observers.
    fn transition(&self, f: impl FnOnce(ConnectionState) -> Option<ConnectionState>) {
        let mut state = self.state.write();
        let Some(next) = f(*state) else { return };
        *state = next;
        debug!(state = %next, "connection state");
        for observer in self.observers.lock().iter() {
            observer(next);
        }
    }
}

/// Resets an abandoned connection attempt to `Disconnected`.
struct ConnectAttempt<'a> {
    shared: &'a Shared,
}

impl Drop for ConnectAttempt<'_> {
    fn drop(&mut self) {
        self.shared.transition(|state| {
            (state == ConnectionState::Connecting).then_some(ConnectionState::Disconnected)
        });
    }
}

/// Read access to the wallet session and the wallet capability.
#[derive(Clone)]
pub struct SessionView {
    shared: Arc<Shared>,
}

impl fmt::Debug for SessionView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionView").field("state", &*self.shared.state.read()).finish()
    }
}

impl SessionView {
    pub fn connected_address(&self) -> Option<Address> {
        self.shared.state.read().address()
    }

    pub fn wallet(&self) -> Option<&Arc<dyn WalletProvider>> {
        self.shared.wallet.as_ref()
    }
}
