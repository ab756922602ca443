#![warn(unused_crate_dependencies, unreachable_pub)]

#[macro_use]
extern crate tracing;

use alloy_primitives::{Address, address};

mod gate;
pub use gate::Gate;

mod mock;
pub use mock::{MockReader, MockWriter, SubmittedCall};

pub mod rpc;

mod wallet;
pub use wallet::MockWallet;

/// The first dev account of anvil and hardhat nodes.
pub const ALICE: Address = address!("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266");

/// The second dev account of anvil and hardhat nodes.
pub const BOB: Address = address!("0x70997970C51812dc3A010C7d01b50e0d17dc79C8");

/// Where the counter contract lands when it is the first deployment on a fresh dev node.
pub const COUNTER_ADDRESS: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";

/// Initializes tracing for tests.
pub fn init_tracing() {
    let _ = tracing_subscriber::FmtSubscriber::builder()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
