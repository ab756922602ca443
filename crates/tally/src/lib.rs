//! # tally
//!
//! Keeps a local view of an on-chain counter in sync with wallet-signed transactions.
//!
//! The [`InteractionController`] drives everything: it connects a wallet through the
//! [`ConnectionController`], reads the counter through a [`ReadClient`] and writes it through a
//! [`WriteClient`], publishing a [`ControllerSnapshot`] after every transition.

#[macro_use]
extern crate tracing;

pub mod connection;
pub mod controller;
pub mod read;
pub mod state;
pub mod write;

pub use connection::{ConnectionController, ConnectionState, SessionView, WalletSession};
pub use controller::{
    CounterBinding, ControllerSnapshot, INCREMENT, InteractionController, NUMBER, SET_NUMBER,
};
pub use read::{ReadClient, RpcReadClient};
pub use state::{CounterState, OperationKind, PendingOperation, Phase, parse_requested_value};
pub use write::{ConfirmationReceipt, RpcWriteClient, TxHandle, WriteClient};

/// A controller wired to a live node.
pub type RpcController = InteractionController<RpcReadClient, RpcWriteClient>;
