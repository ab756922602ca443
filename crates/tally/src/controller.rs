//! The interaction controller: sequences connect, submit, confirm and refresh, and owns the
//! observable counter state.
//!
//! One write cycle (`Submitting -> AwaitingConfirmation -> Refreshing`) runs at a time. Reads
//! are numbered when they start; a read result is only applied if no write confirmed after it
//! started and no newer read was applied first, so a slow read never overwrites fresher state.

use crate::{
    connection::{ConnectionController, ConnectionState},
    read::ReadClient,
    state::{CounterState, OperationKind, PendingOperation, Phase, parse_requested_value},
    write::WriteClient,
};
use alloy_dyn_abi::{DynSolType, DynSolValue};
use alloy_primitives::{Address, U256};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use tally_common::{ContractDescriptor, ControllerError, Mutability};
use tokio::sync::watch;

/// The counter's read function.
pub const NUMBER: &str = "number";
/// The counter's increment function.
pub const INCREMENT: &str = "increment";
/// The counter's setter.
pub const SET_NUMBER: &str = "setNumber";

/// A contract descriptor checked, once, to expose the counter functions with the expected shape.
#[derive(Clone, Debug)]
pub struct CounterBinding {
    contract: ContractDescriptor,
}

impl CounterBinding {
    /// Verifies `number() view returns (uint256)`, `increment()` and `setNumber(uint256)`.
    pub fn bind(contract: &ContractDescriptor) -> Result<Self, ControllerError> {
        let uint = DynSolType::Uint(256);

        let number = contract.resolve(NUMBER, Mutability::ReadOnly)?;
        if !number.inputs.is_empty() || number.outputs != [uint.clone()] {
            return Err(ControllerError::mismatch(
                NUMBER,
                format!("must be `number() returns (uint256)`, found `{number}`"),
            ));
        }

        let increment = contract.resolve(INCREMENT, Mutability::StateChanging)?;
        if !increment.inputs.is_empty() {
            return Err(ControllerError::mismatch(
                INCREMENT,
                format!("must be `increment()`, found `{increment}`"),
            ));
        }

        let set = contract.resolve(SET_NUMBER, Mutability::StateChanging)?;
        if set.inputs.len() != 1 || set.inputs[0].ty != uint {
            return Err(ControllerError::mismatch(
                SET_NUMBER,
                format!("must be `setNumber(uint256)`, found `{set}`"),
            ));
        }

        Ok(Self { contract: contract.clone() })
    }

    pub fn contract(&self) -> &ContractDescriptor {
        &self.contract
    }
}

/// Everything a presentation layer needs to render the controller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ControllerSnapshot {
    pub connection: ConnectionState,
    pub counter: CounterState,
    pub phase: Phase,
    /// Set iff `counter.pending_operation` is.
    pub busy: bool,
    #[serde(serialize_with = "serialize_error")]
    pub last_error: Option<ControllerError>,
}

fn serialize_error<S: serde::Serializer>(
    err: &Option<ControllerError>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match err {
        Some(err) => serializer.serialize_some(&err.to_string()),
        None => serializer.serialize_none(),
    }
}

#[derive(Debug, Default)]
struct Inner {
    phase: Phase,
    counter: CounterState,
    last_error: Option<ControllerError>,
    /// Plain refreshes currently running.
    reads_in_flight: usize,
    /// Sequence number handed to the next read.
    next_read: u64,
    /// Sequence number of the read `counter.value` came from.
    applied_read: u64,
    /// Bumped every time a write confirms.
    write_epoch: u64,
}

impl Inner {
    /// Phase to fall back to once the current step is over.
    fn resting_phase(&self) -> Phase {
        if self.reads_in_flight > 0 { Phase::Reading } else { Phase::Idle }
    }

    fn start_read(&mut self) -> ReadTicket {
        self.next_read += 1;
        ReadTicket { seq: self.next_read, epoch: self.write_epoch }
    }

    /// Applies a read result unless something fresher is already known.
    fn apply_read(&mut self, ticket: ReadTicket, value: U256) -> bool {
        if ticket.epoch != self.write_epoch || ticket.seq <= self.applied_read {
            return false;
        }
        self.counter.value = value;
        self.counter.last_synced_at = Some(ticket.seq);
        self.applied_read = ticket.seq;
        true
    }
}

#[derive(Clone, Copy, Debug)]
struct ReadTicket {
    seq: u64,
    epoch: u64,
}

/// The core state machine behind `connect`, `refresh`, `increment` and `setValue`.
///
/// Every failure is recorded as the last error and returned to the caller; the controller is
/// always back at rest afterwards.
pub struct InteractionController<R, W> {
    binding: CounterBinding,
    connection: ConnectionController,
    reader: R,
    writer: W,
    inner: Mutex<Inner>,
    snapshot: Arc<watch::Sender<ControllerSnapshot>>,
}

impl<R, W> std::fmt::Debug for InteractionController<R, W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InteractionController")
            .field("contract", &self.binding.contract().address())
            .field("snapshot", &*self.snapshot.borrow())
            .finish_non_exhaustive()
    }
}

impl<R: ReadClient, W: WriteClient> InteractionController<R, W> {
    /// Creates an idle controller. Fails if `contract` doesn't expose the counter functions.
    pub fn new(
        contract: &ContractDescriptor,
        connection: ConnectionController,
        reader: R,
        writer: W,
    ) -> Result<Self, ControllerError> {
        let binding = CounterBinding::bind(contract)?;
        let inner = Inner::default();
        let snapshot = Arc::new(watch::Sender::new(ControllerSnapshot {
            connection: ConnectionState::Disconnected,
            counter: inner.counter.clone(),
            phase: inner.phase,
            busy: false,
            last_error: None,
        }));
        // the connection field is only ever written from here
        connection.observe({
            let snapshot = snapshot.clone();
            move |state| {
                snapshot.send_if_modified(|current| {
                    let changed = current.connection != state;
                    current.connection = state;
                    changed
                });
            }
        });
        Ok(Self { binding, connection, reader, writer, inner: Mutex::new(inner), snapshot })
    }

    pub fn contract(&self) -> &ContractDescriptor {
        self.binding.contract()
    }

    pub fn connection(&self) -> &ConnectionController {
        &self.connection
    }

    /// The current observable state.
    pub fn snapshot(&self) -> ControllerSnapshot {
        self.snapshot.borrow().clone()
    }

    /// A receiver notified on every state transition.
    pub fn subscribe(&self) -> watch::Receiver<ControllerSnapshot> {
        self.snapshot.subscribe()
    }

    /// Connects the wallet. Idempotent once connected.
    pub async fn connect(&self) -> Result<Address, ControllerError> {
        self.update(|inner| inner.last_error = None);
        let result = self.connection.request_connection().await;
        self.update(|inner| {
            if let Err(err) = &result {
                inner.last_error = Some(err.clone());
            }
        });
        result
    }

    /// Re-reads the counter from the chain.
    ///
    /// On failure the counter is left untouched. May run alongside a write cycle, whose phase is
    /// then kept.
    pub async fn refresh(&self) -> Result<U256, ControllerError> {
        let ticket = self.update(|inner| {
            inner.last_error = None;
            inner.reads_in_flight += 1;
            if !inner.phase.is_write() {
                inner.phase = Phase::Reading;
            }
            inner.start_read()
        });
        let _read = ReadGuard { controller: self };

        let result = self.reader.read_value(self.contract(), NUMBER).await;
        self.update(|inner| match result {
            Ok(value) => {
                if !inner.apply_read(ticket, value) {
                    debug!(seq = ticket.seq, %value, "discarding stale read");
                }
                Ok(inner.counter.value)
            }
            Err(err) => {
                inner.last_error = Some(err.clone());
                Err(err)
            }
        })
    }

    /// Increments the counter on chain, then adopts the value read back after confirmation.
    pub async fn increment(&self) -> Result<U256, ControllerError> {
        self.write(OperationKind::Increment, || Ok((None, Vec::new()))).await
    }

    /// Sets the counter to `requested`, a decimal or `0x` hex non-negative integer.
    ///
    /// Invalid input fails with [`ControllerError::InvalidInput`] before anything is sent.
    pub async fn set_value(&self, requested: &str) -> Result<U256, ControllerError> {
        self.write(OperationKind::SetValue, || {
            let value = parse_requested_value(requested)?;
            Ok((Some(value), vec![DynSolValue::Uint(value, 256)]))
        })
        .await
    }

    async fn write(
        &self,
        kind: OperationKind,
        prepare: impl FnOnce() -> Result<(Option<U256>, Vec<DynSolValue>), ControllerError>,
    ) -> Result<U256, ControllerError> {
        let (signer, args) = self.begin_write(kind, prepare)?;
        let _cycle = WriteCycle { controller: self };

        let result = self.run_write(kind, signer, &args).await;
        if let Err(err) = &result {
            warn!(?kind, %err, "write failed");
            self.update(|inner| inner.last_error = Some(err.clone()));
        }
        result
    }

    /// Claims the controller for a write cycle.
    fn begin_write(
        &self,
        kind: OperationKind,
        prepare: impl FnOnce() -> Result<(Option<U256>, Vec<DynSolValue>), ControllerError>,
    ) -> Result<(Address, Vec<DynSolValue>), ControllerError> {
        let mut inner = self.inner.lock();
        if inner.phase != Phase::Idle {
            debug!(?kind, phase = %inner.phase, "rejecting write, controller busy");
            return Err(ControllerError::OperationInProgress);
        }
        inner.last_error = None;

        let claimed = prepare().and_then(|(requested_value, args)| {
            let signer = self
                .connection
                .session()
                .connected_address
                .ok_or(ControllerError::NoActiveSession)?;
            Ok((requested_value, signer, args))
        });
        match claimed {
            Ok((requested_value, signer, args)) => {
                inner.counter.pending_operation =
                    Some(PendingOperation { kind, requested_value, tx_hash: None });
                inner.phase = Phase::Submitting;
                debug!(?kind, ?requested_value, phase = %inner.phase, "write started");
                self.publish(&inner);
                Ok((signer, args))
            }
            Err(err) => {
                inner.last_error = Some(err.clone());
                self.publish(&inner);
                Err(err)
            }
        }
    }

    async fn run_write(
        &self,
        kind: OperationKind,
        signer: Address,
        args: &[DynSolValue],
    ) -> Result<U256, ControllerError> {
        let function = match kind {
            OperationKind::Increment => INCREMENT,
            OperationKind::SetValue => SET_NUMBER,
        };

        let handle = self.writer.submit(self.contract(), function, args, Some(signer)).await?;
        self.update(|inner| {
            if let Some(pending) = &mut inner.counter.pending_operation {
                pending.tx_hash = Some(handle.hash);
            }
            inner.phase = Phase::AwaitingConfirmation;
            debug!(tx = %handle, phase = %inner.phase, "transaction submitted");
        });

        let receipt = self.writer.await_confirmation(&handle).await?;
        let ticket = self.update(|inner| {
            inner.write_epoch += 1;
            inner.phase = Phase::Refreshing;
            debug!(
                tx = %handle,
                block = ?receipt.block_number,
                phase = %inner.phase,
                "transaction confirmed"
            );
            inner.start_read()
        });

        // the chain is the source of truth, a concurrent write may have landed in between
        let value = self.reader.read_value(self.contract(), NUMBER).await?;
        Ok(self.update(|inner| {
            if !inner.apply_read(ticket, value) {
                debug!(seq = ticket.seq, %value, "discarding stale read");
            }
            inner.counter.value
        }))
    }

    /// Mutates the state under the lock and publishes the result.
    fn update<T>(&self, f: impl FnOnce(&mut Inner) -> T) -> T {
        let mut inner = self.inner.lock();
        let out = f(&mut inner);
        self.publish(&inner);
        out
    }

    fn publish(&self, inner: &Inner) {
        self.snapshot.send_if_modified(|current| {
            let snapshot = ControllerSnapshot {
                connection: current.connection,
                counter: inner.counter.clone(),
                phase: inner.phase,
                busy: inner.counter.pending_operation.is_some(),
                last_error: inner.last_error.clone(),
            };
            if *current == snapshot {
                return false;
            }
            *current = snapshot;
            true
        });
    }
}

/// Ends a refresh, including one whose future was dropped.
struct ReadGuard<'a, R: ReadClient, W: WriteClient> {
    controller: &'a InteractionController<R, W>,
}

impl<R: ReadClient, W: WriteClient> Drop for ReadGuard<'_, R, W> {
    fn drop(&mut self) {
        self.controller.update(|inner| {
            inner.reads_in_flight = inner.reads_in_flight.saturating_sub(1);
            if inner.phase == Phase::Reading {
                inner.phase = inner.resting_phase();
            }
        });
    }
}

/// Ends a write cycle, including one whose future was dropped.
struct WriteCycle<'a, R: ReadClient, W: WriteClient> {
    controller: &'a InteractionController<R, W>,
}

impl<R: ReadClient, W: WriteClient> Drop for WriteCycle<'_, R, W> {
    fn drop(&mut self) {
        self.controller.update(|inner| {
            inner.counter.pending_operation = None;
            inner.phase = inner.resting_phase();
            debug!(phase = %inner.phase, "write cycle finished");
        });
    }
}
