//! Scripted [`ReadClient`] and [`WriteClient`] implementations.

use crate::Gate;
use alloy_dyn_abi::DynSolValue;
use alloy_primitives::{Address, TxHash, U256};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::{collections::VecDeque, sync::Arc};
use tally::{ConfirmationReceipt, ReadClient, TxHandle, WriteClient};
use tally_common::{ContractDescriptor, ControllerError};

/// One scripted answer, optionally held back by a [`Gate`].
#[derive(Debug)]
struct Step<T> {
    gate: Option<Gate>,
    result: Result<T, ControllerError>,
}

impl<T> Step<T> {
    async fn run(self) -> Result<T, ControllerError> {
        if let Some(gate) = self.gate {
            gate.pass().await;
        }
        self.result
    }
}

/// A [`ReadClient`] answering from a queue of scripted results.
///
/// An empty queue answers with [`ControllerError::NetworkUnavailable`].
#[derive(Clone, Debug, Default)]
pub struct MockReader {
    inner: Arc<Mutex<ReaderInner>>,
}

#[derive(Debug, Default)]
struct ReaderInner {
    steps: VecDeque<Step<U256>>,
    calls: Vec<String>,
}

impl MockReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a successful read of `value`.
    pub fn push_value(&self, value: U256) -> &Self {
        self.push(None, Ok(value))
    }

    /// Queues a failed read.
    pub fn push_error(&self, err: ControllerError) -> &Self {
        self.push(None, Err(err))
    }

    /// Queues a read of `value` that completes once `gate` lets it through.
    pub fn push_gated(&self, gate: &Gate, value: U256) -> &Self {
        self.push(Some(gate.clone()), Ok(value))
    }

    /// Queues a failed read that completes once `gate` lets it through.
    pub fn push_gated_error(&self, gate: &Gate, err: ControllerError) -> &Self {
        self.push(Some(gate.clone()), Err(err))
    }

    fn push(&self, gate: Option<Gate>, result: Result<U256, ControllerError>) -> &Self {
        self.inner.lock().steps.push_back(Step { gate, result });
        self
    }

    /// Functions read so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.inner.lock().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.inner.lock().calls.len()
    }
}

#[async_trait]
impl ReadClient for MockReader {
    async fn read_value(
        &self,
        _contract: &ContractDescriptor,
        function: &str,
    ) -> Result<U256, ControllerError> {
        let step = {
            let mut inner = self.inner.lock();
            inner.calls.push(function.to_string());
            inner.steps.pop_front()
        };
        trace!(function, scripted = step.is_some(), "mock read");
        match step {
            Some(step) => step.run().await,
            None => Err(ControllerError::NetworkUnavailable("no scripted read".to_string())),
        }
    }
}

/// A call received by [`MockWriter::submit`].
#[derive(Clone, Debug, PartialEq)]
pub struct SubmittedCall {
    pub function: String,
    pub args: Vec<DynSolValue>,
    pub signer: Option<Address>,
}

/// A [`WriteClient`] answering from scripted results.
///
/// Unscripted submissions succeed with hashes `0x..01`, `0x..02`, ... and unscripted
/// confirmations succeed in block 1.
#[derive(Clone, Debug, Default)]
pub struct MockWriter {
    inner: Arc<Mutex<WriterInner>>,
}

#[derive(Debug, Default)]
struct WriterInner {
    submits: VecDeque<Step<TxHandle>>,
    confirms: VecDeque<Step<()>>,
    submitted: Vec<SubmittedCall>,
    confirmed: Vec<TxHandle>,
}

impl MockWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues the outcome of the next submission.
    pub fn push_submit(&self, result: Result<TxHandle, ControllerError>) -> &Self {
        self.inner.lock().submits.push_back(Step { gate: None, result });
        self
    }

    /// Queues a submission that returns once `gate` lets it through.
    pub fn push_gated_submit(
        &self,
        gate: &Gate,
        result: Result<TxHandle, ControllerError>,
    ) -> &Self {
        self.inner.lock().submits.push_back(Step { gate: Some(gate.clone()), result });
        self
    }

    /// Queues the outcome of the next confirmation wait.
    pub fn push_confirm(&self, result: Result<(), ControllerError>) -> &Self {
        self.inner.lock().confirms.push_back(Step { gate: None, result });
        self
    }

    /// Queues a confirmation wait that returns once `gate` lets it through.
    pub fn push_gated_confirm(&self, gate: &Gate, result: Result<(), ControllerError>) -> &Self {
        self.inner.lock().confirms.push_back(Step { gate: Some(gate.clone()), result });
        self
    }

    /// Calls submitted so far, in order.
    pub fn submitted(&self) -> Vec<SubmittedCall> {
        self.inner.lock().submitted.clone()
    }

    pub fn submit_count(&self) -> usize {
        self.inner.lock().submitted.len()
    }

    /// Handles waited on so far, in order.
    pub fn confirmed(&self) -> Vec<TxHandle> {
        self.inner.lock().confirmed.clone()
    }
}

#[async_trait]
impl WriteClient for MockWriter {
    async fn submit(
        &self,
        _contract: &ContractDescriptor,
        function: &str,
        args: &[DynSolValue],
        signer: Option<Address>,
    ) -> Result<TxHandle, ControllerError> {
        let step = {
            let mut inner = self.inner.lock();
            inner.submitted.push(SubmittedCall {
                function: function.to_string(),
                args: args.to_vec(),
                signer,
            });
            let n = inner.submitted.len();
            inner.submits.pop_front().unwrap_or_else(|| Step {
                gate: None,
                result: Ok(TxHandle::from(TxHash::with_last_byte(n as u8))),
            })
        };
        trace!(function, ?signer, "mock submit");
        step.run().await
    }

    async fn await_confirmation(
        &self,
        handle: &TxHandle,
    ) -> Result<ConfirmationReceipt, ControllerError> {
        let step = {
            let mut inner = self.inner.lock();
            inner.confirmed.push(*handle);
            inner.confirms.pop_front().unwrap_or(Step { gate: None, result: Ok(()) })
        };
        trace!(tx = %handle, "mock confirmation");
        step.run().await?;
        Ok(ConfirmationReceipt { tx_hash: handle.hash, block_number: Some(1), gas_used: 21_000 })
    }
}
