//! Commonly used constants.

use std::time::Duration;

/// The default timeout for a single RPC request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(45);

/// Poll interval used against local dev nodes (anvil, hardhat).
pub const LOCAL_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Poll interval used against remote endpoints.
pub const REMOTE_POLL_INTERVAL: Duration = Duration::from_secs(7);

/// The counter contract ABI bundled with tally.
pub const COUNTER_ABI: &str = include_str!("../abi/Counter.json");
