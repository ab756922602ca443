//! Wallet connection lifecycle tests

use parking_lot::Mutex;
use std::sync::Arc;
use tally::{ConnectionController, ConnectionState};
use tally_common::ControllerError;
use tally_test_utils::{ALICE, BOB, Gate, MockWallet};

fn controller(wallet: MockWallet) -> (ConnectionController, Arc<MockWallet>) {
    let wallet = Arc::new(wallet);
    (ConnectionController::new(Some(wallet.clone())), wallet)
}

#[tokio::test]
async fn connects_with_the_first_account() {
    let (connection, _) = controller(MockWallet::with_accounts(vec![BOB, ALICE]));
    assert_eq!(connection.state(), ConnectionState::Disconnected);
    assert_eq!(connection.session().connected_address, None);

    assert_eq!(connection.request_connection().await.unwrap(), BOB);
    assert_eq!(connection.state(), ConnectionState::Connected(BOB));
    assert_eq!(connection.session().connected_address, Some(BOB));
    assert_eq!(connection.session_view().connected_address(), Some(BOB));
}

#[tokio::test]
async fn is_connecting_while_the_wallet_prompts() {
    let gate = Gate::new();
    let (connection, _) = controller(MockWallet::new(ALICE).gated(&gate));

    let task = tokio::spawn({
        let connection = connection.clone();
        async move { connection.request_connection().await }
    });
    gate.entered(1).await;
    assert_eq!(connection.state(), ConnectionState::Connecting);
    assert_eq!(connection.session_view().connected_address(), None);

    gate.open(1);
    assert_eq!(task.await.unwrap().unwrap(), ALICE);
    assert_eq!(connection.state(), ConnectionState::Connected(ALICE));
}

#[tokio::test]
async fn concurrent_requests_prompt_once() {
    let gate = Gate::new();
    let (connection, wallet) = controller(MockWallet::new(ALICE).gated(&gate));

    let spawn = || {
        let connection = connection.clone();
        tokio::spawn(async move { connection.request_connection().await })
    };
    let (first, second) = (spawn(), spawn());
    gate.entered(1).await;
    gate.open(1);

    assert_eq!(first.await.unwrap().unwrap(), ALICE);
    assert_eq!(second.await.unwrap().unwrap(), ALICE);
    assert_eq!(wallet.address_requests(), 1);
}

#[tokio::test]
async fn rejection_goes_back_to_disconnected() {
    let (connection, _) = controller(MockWallet::rejecting_connection());
    let err = connection.request_connection().await.unwrap_err();
    assert!(matches!(err, ControllerError::UserRejected(ref msg) if msg.contains("rejected")));
    assert_eq!(connection.state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn no_accounts_is_a_rejection() {
    let (connection, _) = controller(MockWallet::with_accounts(vec![]));
    let err = connection.request_connection().await.unwrap_err();
    assert!(matches!(err, ControllerError::UserRejected(_)), "{err}");
    assert_eq!(connection.state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn missing_wallet_is_provider_unavailable() {
    let connection = ConnectionController::new(None);
    let err = connection.request_connection().await.unwrap_err();
    assert!(matches!(err, ControllerError::ProviderUnavailable(_)), "{err}");
    assert_eq!(connection.state(), ConnectionState::Disconnected);
    assert!(connection.session_view().wallet().is_none());

    let (connection, _) = controller(MockWallet::unavailable());
    let err = connection.request_connection().await.unwrap_err();
    assert!(matches!(err, ControllerError::ProviderUnavailable(_)), "{err}");
}

#[tokio::test]
async fn abandoned_attempt_resets_the_state() {
    let gate = Gate::new();
    let (connection, _) = controller(MockWallet::new(ALICE).gated(&gate));

    let task = tokio::spawn({
        let connection = connection.clone();
        async move { connection.request_connection().await }
    });
    gate.entered(1).await;
    task.abort();
    assert!(task.await.unwrap_err().is_cancelled());
    assert_eq!(connection.state(), ConnectionState::Disconnected);

    // a later attempt still goes through
    gate.open(1);
    assert_eq!(connection.request_connection().await.unwrap(), ALICE);
}

#[tokio::test]
async fn observers_see_every_transition_in_order() {
    let (connection, _) = controller(MockWallet::rejecting_connection());
    let seen = Arc::new(Mutex::new(Vec::new()));
    connection.observe({
        let seen = seen.clone();
        move |state| seen.lock().push(state)
    });

    connection.request_connection().await.unwrap_err();
    assert_eq!(
        *seen.lock(),
        [ConnectionState::Disconnected, ConnectionState::Connecting, ConnectionState::Disconnected]
    );
}

#[test]
fn state_display() {
    let connected = ConnectionState::Connected(ALICE);
    assert_eq!(ConnectionState::Disconnected.to_string(), "disconnected");
    assert_eq!(connected.to_string(), format!("connected as {ALICE}"));
    assert_eq!(connected.address(), Some(ALICE));
    assert_eq!(ConnectionState::Connecting.address(), None);
}
