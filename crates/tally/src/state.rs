//! Observable counter state.

use alloy_primitives::{TxHash, U256};
use serde::Serialize;
use std::fmt;
use tally_common::ControllerError;

/// Where the interaction controller is in its cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub enum Phase {
    #[default]
    Idle,
    Reading,
    Submitting,
    AwaitingConfirmation,
    Refreshing,
}

impl Phase {
    /// Returns `true` while a write cycle owns the controller.
    pub fn is_write(&self) -> bool {
        matches!(self, Self::Submitting | Self::AwaitingConfirmation | Self::Refreshing)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Reading => "reading",
            Self::Submitting => "submitting",
            Self::AwaitingConfirmation => "awaiting confirmation",
            Self::Refreshing => "refreshing",
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum OperationKind {
    Increment,
    SetValue,
}

/// The write that is currently in flight.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PendingOperation {
    pub kind: OperationKind,
    /// The value asked for by `setValue`.
    pub requested_value: Option<U256>,
    /// Known once the network accepted the transaction.
    pub tx_hash: Option<TxHash>,
}

/// The last confirmed view of the counter.
///
/// `value` only ever comes from a read. It is never adjusted locally.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CounterState {
    pub value: U256,
    /// Sequence number of the read `value` came from, `None` before the first read.
    pub last_synced_at: Option<u64>,
    pub pending_operation: Option<PendingOperation>,
}

/// Parses user input for `setValue`: a decimal or `0x`-prefixed hex unsigned integer.
pub fn parse_requested_value(input: &str) -> Result<U256, ControllerError> {
    let s = input.trim();
    let invalid = |reason: &str| ControllerError::InvalidInput(format!("`{input}` {reason}"));

    if s.is_empty() {
        return Err(ControllerError::InvalidInput("value must not be empty".to_string()));
    }
    if s.starts_with('-') {
        return Err(invalid("is negative, the counter only holds non-negative integers"));
    }

    let (digits, radix) = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => (hex, 16),
        None => (s, 10),
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix as u32)) {
        return Err(invalid("is not an integer"));
    }
    U256::from_str_radix(digits, radix).map_err(|_| invalid("does not fit in uint256"))
}
