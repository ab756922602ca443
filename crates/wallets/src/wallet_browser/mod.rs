pub mod error;
pub mod server;
pub mod types;

mod app;
mod handlers;
mod queue;
mod router;
mod state;
mod wallet;

pub use wallet::BrowserWallet;
