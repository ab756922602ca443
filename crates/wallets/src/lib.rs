//! Wallet providers for tally.
//!
//! A [`WalletProvider`] hands out the accounts it controls and signs-and-submits contract calls.
//! Three are available: a browser wallet reached through a local page, a raw private key and
//! the node's own unlocked accounts.

#![cfg_attr(not(test), warn(unused_crate_dependencies))]

#[macro_use]
extern crate tracing;

pub mod error;
pub use error::{PrivateKeyError, USER_REJECTED_CODE, WalletError};

mod provider;
pub use provider::{WalletCall, WalletProvider};

mod local;
pub use local::{LocalWallet, create_private_key_signer};

mod unlocked;
pub use unlocked::UnlockedWallet;

pub mod opts;
pub use opts::WalletOpts;

#[cfg(feature = "browser")]
pub mod wallet_browser;
#[cfg(feature = "browser")]
pub use wallet_browser::BrowserWallet;
