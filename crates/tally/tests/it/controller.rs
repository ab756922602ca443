//! Interaction controller state machine tests

use crate::utils::{Harness, counter};
use alloy_dyn_abi::{DynSolType, DynSolValue};
use alloy_primitives::{TxHash, U256};
use similar_asserts::assert_eq;
use std::time::Duration;
use tally::{
    ConnectionController, ConnectionState, ControllerSnapshot, InteractionController,
    OperationKind, Phase, TxHandle,
};
use tally_common::{
    ContractDescriptor, ControllerError, FunctionInput, FunctionSignature, Mutability,
};
use tally_test_utils::{ALICE, COUNTER_ADDRESS, Gate, MockReader, MockWallet, MockWriter};

fn assert_at_rest(snapshot: &ControllerSnapshot) {
    assert_eq!(snapshot.phase, Phase::Idle, "{snapshot:?}");
    assert!(!snapshot.busy, "{snapshot:?}");
    assert_eq!(snapshot.counter.pending_operation, None, "{snapshot:?}");
}

#[tokio::test]
async fn connect_increment_refresh() {
    let h = Harness::new();
    assert_eq!(h.controller.snapshot().connection, ConnectionState::Disconnected);

    let address = h.controller.connect().await.unwrap();
    assert_eq!(address, ALICE);
    assert_eq!(h.controller.snapshot().connection, ConnectionState::Connected(ALICE));

    let handle = TxHash::with_last_byte(1);
    h.writer.push_submit(Ok(handle.into()));
    h.reader.push_value(U256::from(5));

    let value = h.controller.increment().await.unwrap();
    assert_eq!(value, U256::from(5));

    let snapshot = h.controller.snapshot();
    assert_at_rest(&snapshot);
    assert_eq!(snapshot.counter.value, U256::from(5));
    assert_eq!(snapshot.last_error, None);

    let submitted = h.writer.submitted();
    assert_eq!(submitted.len(), 1);
    assert_eq!(submitted[0].function, "increment");
    assert!(submitted[0].args.is_empty());
    assert_eq!(submitted[0].signer, Some(ALICE));
    assert_eq!(h.writer.confirmed(), vec![TxHandle::from(handle)]);
    assert_eq!(h.reader.calls(), vec!["number".to_string()]);
}

#[tokio::test]
async fn set_value_rejected_by_wallet() {
    let h = Harness::connected().await;
    h.reader.push_value(U256::from(7));
    h.controller.refresh().await.unwrap();

    h.writer.push_submit(Err(ControllerError::UserRejected("User denied".to_string())));
    let err = h.controller.set_value("42").await.unwrap_err();
    assert!(matches!(err, ControllerError::UserRejected(_)), "{err}");

    let snapshot = h.controller.snapshot();
    assert_at_rest(&snapshot);
    assert_eq!(snapshot.counter.value, U256::from(7));
    assert_eq!(snapshot.last_error, Some(err));
    assert_eq!(h.writer.submitted()[0].args, vec![DynSolValue::Uint(U256::from(42), 256)]);
    assert!(h.writer.confirmed().is_empty());
    assert_eq!(h.reader.call_count(), 1);
}

#[tokio::test]
async fn invalid_input_never_reaches_the_writer() {
    let h = Harness::connected().await;
    for input in ["-1", "-42", "abc", "", "1.5"] {
        let err = h.controller.set_value(input).await.unwrap_err();
        assert!(matches!(err, ControllerError::InvalidInput(_)), "{input:?}: {err}");

        let snapshot = h.controller.snapshot();
        assert_at_rest(&snapshot);
        assert_eq!(snapshot.last_error, Some(err));
    }
    assert_eq!(h.writer.submit_count(), 0);
    assert_eq!(h.wallet.submit_count(), 0);
}

#[tokio::test]
async fn write_requires_a_session() {
    let h = Harness::new();

    let err = h.controller.increment().await.unwrap_err();
    assert_eq!(err, ControllerError::NoActiveSession);
    // input is checked before the session
    let err = h.controller.set_value("-1").await.unwrap_err();
    assert!(matches!(err, ControllerError::InvalidInput(_)), "{err}");
    let err = h.controller.set_value("1").await.unwrap_err();
    assert_eq!(err, ControllerError::NoActiveSession);

    assert_eq!(h.writer.submit_count(), 0);
    assert_at_rest(&h.controller.snapshot());
}

#[tokio::test]
async fn increment_adopts_the_chain_value() {
    let h = Harness::connected().await;
    h.reader.push_value(U256::from(10));
    h.controller.refresh().await.unwrap();

    // someone else incremented in between
    h.reader.push_value(U256::from(12));
    let value = h.controller.increment().await.unwrap();
    assert_eq!(value, U256::from(12));
    assert_eq!(h.controller.snapshot().counter.value, U256::from(12));
}

#[tokio::test]
async fn set_value_adopts_the_chain_value() {
    let h = Harness::connected().await;
    h.reader.push_value(U256::from(43));
    let value = h.controller.set_value("0x2a").await.unwrap();
    assert_eq!(value, U256::from(43));
}

#[tokio::test]
async fn refresh_failure_keeps_the_value() {
    let h = Harness::new();
    h.reader.push_value(U256::from(3));
    h.controller.refresh().await.unwrap();
    let before = h.controller.snapshot().counter;

    let err = ControllerError::NetworkUnavailable("connection refused".to_string());
    h.reader.push_error(err.clone());
    assert_eq!(h.controller.refresh().await.unwrap_err(), err);

    let snapshot = h.controller.snapshot();
    assert_eq!(snapshot.counter, before);
    assert_eq!(snapshot.phase, Phase::Idle);
    assert_eq!(snapshot.last_error, Some(err));

    // the next operation starts with a clean slate
    h.reader.push_value(U256::from(4));
    h.controller.refresh().await.unwrap();
    assert_eq!(h.controller.snapshot().last_error, None);
}

#[tokio::test]
async fn refresh_does_not_need_a_wallet() {
    let connection = ConnectionController::new(None);
    let reader = MockReader::new();
    let controller =
        InteractionController::new(&counter(), connection, reader.clone(), MockWriter::new())
            .unwrap();

    reader.push_value(U256::from(9));
    assert_eq!(controller.refresh().await.unwrap(), U256::from(9));
    assert_eq!(controller.snapshot().counter.last_synced_at, Some(1));

    let err = controller.connect().await.unwrap_err();
    assert!(matches!(err, ControllerError::ProviderUnavailable(_)), "{err}");
    assert_eq!(controller.snapshot().connection, ConnectionState::Disconnected);
}

#[tokio::test]
async fn phases_of_a_write_cycle() {
    let h = Harness::connected().await;
    let (submit, confirm, read) = (Gate::new(), Gate::new(), Gate::new());
    h.writer.push_gated_submit(&submit, Ok(TxHash::with_last_byte(7).into()));
    h.writer.push_gated_confirm(&confirm, Ok(()));
    h.reader.push_gated(&read, U256::from(8));

    let controller = h.controller.clone();
    let task = tokio::spawn(async move { controller.set_value("8").await });

    submit.entered(1).await;
    let snapshot = h.controller.snapshot();
    assert_eq!(snapshot.phase, Phase::Submitting);
    assert!(snapshot.busy);
    let pending = snapshot.counter.pending_operation.unwrap();
    assert_eq!(pending.kind, OperationKind::SetValue);
    assert_eq!(pending.requested_value, Some(U256::from(8)));
    assert_eq!(pending.tx_hash, None);
    submit.open(1);

    confirm.entered(1).await;
    let snapshot = h.controller.snapshot();
    assert_eq!(snapshot.phase, Phase::AwaitingConfirmation);
    assert_eq!(
        snapshot.counter.pending_operation.unwrap().tx_hash,
        Some(TxHash::with_last_byte(7))
    );
    confirm.open(1);

    read.entered(1).await;
    let snapshot = h.controller.snapshot();
    assert_eq!(snapshot.phase, Phase::Refreshing);
    assert!(snapshot.busy);
    read.open(1);

    assert_eq!(task.await.unwrap().unwrap(), U256::from(8));
    assert_at_rest(&h.controller.snapshot());
}

#[tokio::test]
async fn busy_iff_pending_operation() {
    let h = Harness::connected().await;
    let mut rx = h.controller.subscribe();
    let watcher = tokio::spawn(async move {
        let mut seen = 0usize;
        while rx.changed().await.is_ok() {
            let snapshot = rx.borrow_and_update().clone();
            let pending = snapshot.counter.pending_operation.is_some();
            assert_eq!(snapshot.busy, pending, "{snapshot:?}");
            seen += 1;
        }
        seen
    });

    h.reader.push_value(U256::from(1));
    h.controller.increment().await.unwrap();
    h.writer.push_confirm(Err(ControllerError::ExecutionReverted {
        tx_hash: TxHash::with_last_byte(2),
    }));
    h.controller.increment().await.unwrap_err();
    h.controller.set_value("x").await.unwrap_err();

    let Harness { controller, .. } = h;
    drop(controller);
    assert!(watcher.await.unwrap() > 0);
}

#[tokio::test]
async fn concurrent_write_is_rejected_without_side_effects() {
    let h = Harness::connected().await;
    let gate = Gate::new();
    h.writer.push_gated_submit(&gate, Ok(TxHash::with_last_byte(1).into()));
    h.reader.push_value(U256::from(1));

    let controller = h.controller.clone();
    let first = tokio::spawn(async move { controller.increment().await });
    gate.entered(1).await;

    let before = h.controller.snapshot();
    for attempt in [h.controller.set_value("9").await, h.controller.increment().await] {
        assert_eq!(attempt.unwrap_err(), ControllerError::OperationInProgress);
    }
    // the busy check comes before input validation
    let err = h.controller.set_value("-1").await.unwrap_err();
    assert_eq!(err, ControllerError::OperationInProgress);
    assert_eq!(h.controller.snapshot(), before);
    assert_eq!(h.writer.submit_count(), 1);

    gate.open(1);
    assert_eq!(first.await.unwrap().unwrap(), U256::from(1));
    assert_at_rest(&h.controller.snapshot());
}

#[tokio::test]
async fn refresh_in_flight_blocks_writes() {
    let h = Harness::connected().await;
    let gate = Gate::new();
    h.reader.push_gated(&gate, U256::from(2));

    let controller = h.controller.clone();
    let refresh = tokio::spawn(async move { controller.refresh().await });
    gate.entered(1).await;
    assert_eq!(h.controller.snapshot().phase, Phase::Reading);

    let err = h.controller.increment().await.unwrap_err();
    assert_eq!(err, ControllerError::OperationInProgress);
    assert_eq!(h.writer.submit_count(), 0);

    gate.open(1);
    assert_eq!(refresh.await.unwrap().unwrap(), U256::from(2));
    assert_eq!(h.controller.snapshot().phase, Phase::Idle);
}

#[tokio::test]
async fn confirmation_timeout_then_manual_refresh() {
    let h = Harness::connected().await;
    h.reader.push_value(U256::from(4));
    h.controller.refresh().await.unwrap();

    let tx_hash = TxHash::with_last_byte(1);
    let timeout =
        ControllerError::ConfirmationTimeout { tx_hash, timeout: Duration::from_secs(120) };
    h.writer.push_confirm(Err(timeout.clone()));

    let err = h.controller.increment().await.unwrap_err();
    assert_eq!(err, timeout);
    assert!(err.is_transient());

    let snapshot = h.controller.snapshot();
    assert_at_rest(&snapshot);
    assert_eq!(snapshot.counter.value, U256::from(4));
    assert_eq!(snapshot.last_error, Some(timeout));
    // no read after a failed confirmation
    assert_eq!(h.reader.call_count(), 1);

    // the transaction confirmed out of band
    h.reader.push_value(U256::from(5));
    assert_eq!(h.controller.refresh().await.unwrap(), U256::from(5));
    assert_eq!(h.controller.snapshot().last_error, None);
}

#[tokio::test]
async fn failed_read_after_confirmation_is_reported() {
    let h = Harness::connected().await;
    h.reader.push_value(U256::from(1));
    h.controller.refresh().await.unwrap();

    let err = ControllerError::NetworkUnavailable("timeout".to_string());
    h.reader.push_error(err.clone());
    assert_eq!(h.controller.increment().await.unwrap_err(), err);

    let snapshot = h.controller.snapshot();
    assert_at_rest(&snapshot);
    assert_eq!(snapshot.counter.value, U256::from(1));
    assert_eq!(h.writer.confirmed().len(), 1);
}

#[tokio::test]
async fn stale_read_started_before_a_confirmed_write_is_discarded() {
    let h = Harness::connected().await;
    let (confirm, stale) = (Gate::new(), Gate::new());
    h.writer.push_gated_confirm(&confirm, Ok(()));

    let controller = h.controller.clone();
    let write = tokio::spawn(async move { controller.increment().await });
    confirm.entered(1).await;

    // a refresh starts while the write is awaiting confirmation
    h.reader.push_gated(&stale, U256::from(100));
    h.reader.push_value(U256::from(6));
    let controller = h.controller.clone();
    let refresh = tokio::spawn(async move { controller.refresh().await });
    stale.entered(1).await;
    assert_eq!(h.controller.snapshot().phase, Phase::AwaitingConfirmation);

    confirm.open(1);
    assert_eq!(write.await.unwrap().unwrap(), U256::from(6));
    let snapshot = h.controller.snapshot();
    assert!(!snapshot.busy);
    assert_eq!(snapshot.phase, Phase::Reading);

    stale.open(1);
    assert_eq!(refresh.await.unwrap().unwrap(), U256::from(6));
    let snapshot = h.controller.snapshot();
    assert_eq!(snapshot.counter.value, U256::from(6));
    assert_eq!(snapshot.phase, Phase::Idle);
}

#[tokio::test]
async fn older_read_never_overwrites_a_newer_one() {
    let h = Harness::new();
    let slow = Gate::new();
    h.reader.push_gated(&slow, U256::from(1));
    h.reader.push_value(U256::from(2));

    let controller = h.controller.clone();
    let first = tokio::spawn(async move { controller.refresh().await });
    slow.entered(1).await;

    assert_eq!(h.controller.refresh().await.unwrap(), U256::from(2));
    // still waiting on the first read
    assert_eq!(h.controller.snapshot().phase, Phase::Reading);

    slow.open(1);
    assert_eq!(first.await.unwrap().unwrap(), U256::from(2));
    let snapshot = h.controller.snapshot();
    assert_eq!(snapshot.counter.value, U256::from(2));
    assert_eq!(snapshot.counter.last_synced_at, Some(2));
    assert_eq!(snapshot.phase, Phase::Idle);
}

#[tokio::test]
async fn cancelled_write_does_not_stay_busy() {
    let h = Harness::connected().await;
    let gate = Gate::new();
    h.writer.push_gated_submit(&gate, Ok(TxHash::with_last_byte(1).into()));

    let controller = h.controller.clone();
    let task = tokio::spawn(async move { controller.increment().await });
    gate.entered(1).await;
    assert!(h.controller.snapshot().busy);

    task.abort();
    assert!(task.await.unwrap_err().is_cancelled());
    assert_at_rest(&h.controller.snapshot());

    h.reader.push_value(U256::from(1));
    assert_eq!(h.controller.increment().await.unwrap(), U256::from(1));
}

#[tokio::test]
async fn connection_failures_are_recorded() {
    let h = Harness::with_wallet(MockWallet::rejecting_connection());
    let err = h.controller.connect().await.unwrap_err();
    assert!(matches!(err, ControllerError::UserRejected(_)), "{err}");
    let snapshot = h.controller.snapshot();
    assert_eq!(snapshot.connection, ConnectionState::Disconnected);
    assert_eq!(snapshot.last_error, Some(err));

    let h = Harness::with_wallet(MockWallet::unavailable());
    let err = h.controller.connect().await.unwrap_err();
    assert!(matches!(err, ControllerError::ProviderUnavailable(_)), "{err}");
}

#[tokio::test]
async fn snapshot_shows_connecting_while_the_wallet_prompts() {
    let gate = Gate::new();
    let h = Harness::with_wallet(MockWallet::new(ALICE).gated(&gate));
    let mut rx = h.controller.subscribe();

    let controller = h.controller.clone();
    let task = tokio::spawn(async move { controller.connect().await });
    gate.entered(1).await;
    assert_eq!(h.controller.snapshot().connection, ConnectionState::Connecting);
    assert_eq!(rx.borrow_and_update().connection, ConnectionState::Connecting);

    gate.open(1);
    assert_eq!(task.await.unwrap().unwrap(), ALICE);
    assert!(rx.has_changed().unwrap());
    assert_eq!(rx.borrow_and_update().connection, ConnectionState::Connected(ALICE));
}

#[tokio::test]
async fn snapshot_follows_the_connection_controller() {
    let gate = Gate::new();
    let h = Harness::with_wallet(MockWallet::new(ALICE).gated(&gate));

    // connecting behind the interaction controller's back still shows up
    let connection = h.controller.connection().clone();
    let task = tokio::spawn(async move { connection.request_connection().await });
    gate.entered(1).await;
    assert_eq!(h.controller.snapshot().connection, ConnectionState::Connecting);

    task.abort();
    assert!(task.await.unwrap_err().is_cancelled());
    assert_eq!(h.controller.snapshot().connection, ConnectionState::Disconnected);

    gate.open(1);
    h.controller.connection().request_connection().await.unwrap();
    assert_eq!(h.controller.snapshot().connection, ConnectionState::Connected(ALICE));
    assert_at_rest(&h.controller.snapshot());
}

#[tokio::test]
async fn connect_is_idempotent() {
    let h = Harness::connected().await;
    assert_eq!(h.controller.connect().await.unwrap(), ALICE);
    assert_eq!(h.wallet.address_requests(), 1);
}

#[test]
fn rejects_contracts_without_counter_functions() {
    let number = FunctionSignature::new(
        "number",
        vec![],
        vec![DynSolType::Uint(256)],
        Mutability::ReadOnly,
    );
    let contract = ContractDescriptor::new(COUNTER_ADDRESS, [number.clone()]).unwrap();
    let err = InteractionController::new(
        &contract,
        ConnectionController::new(None),
        MockReader::new(),
        MockWriter::new(),
    )
    .unwrap_err();
    assert!(matches!(err, ControllerError::ConfigurationMismatch(_)), "{err}");

    // `setNumber` taking the wrong type
    let increment = FunctionSignature::new("increment", vec![], vec![], Mutability::StateChanging);
    let set = FunctionSignature::new(
        "setNumber",
        vec![FunctionInput::new("value", DynSolType::Bool)],
        vec![],
        Mutability::StateChanging,
    );
    let contract = ContractDescriptor::new(COUNTER_ADDRESS, [number, increment, set]).unwrap();
    let err = InteractionController::new(
        &contract,
        ConnectionController::new(None),
        MockReader::new(),
        MockWriter::new(),
    )
    .unwrap_err();
    assert!(
        matches!(err, ControllerError::ConfigurationMismatch(ref msg) if msg.contains("setNumber")),
        "{err}"
    );
}

#[tokio::test]
async fn snapshot_serializes_errors_as_text() {
    let h = Harness::new();
    h.controller.increment().await.unwrap_err();
    let json = serde_json::to_value(h.controller.snapshot()).unwrap();
    assert_eq!(json["last_error"], "no active wallet session");
    assert_eq!(json["busy"], false);
    assert_eq!(json["phase"], "Idle");
}
