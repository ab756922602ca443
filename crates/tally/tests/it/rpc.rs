//! The controller wired to RPC-backed clients over a mocked transport

use alloy_primitives::{TxHash, U256};
use alloy_transport::mock::Asserter;
use std::sync::Arc;
use tally::{
    ConnectionController, InteractionController, RpcController, RpcReadClient, RpcWriteClient,
};
use tally_common::ControllerError;
use tally_test_utils::{
    ALICE, MockWallet,
    rpc::{mocked_provider, receipt, uint_output},
};

use crate::utils::counter;

fn rpc_controller(wallet: MockWallet) -> (Asserter, Arc<MockWallet>, RpcController) {
    let (asserter, provider) = mocked_provider();
    let wallet = Arc::new(wallet);
    let connection = ConnectionController::new(Some(wallet.clone()));
    let reader = RpcReadClient::new(provider.clone());
    let writer = RpcWriteClient::new(provider, connection.session_view()).with_chain_id(31337);
    let controller = InteractionController::new(&counter(), connection, reader, writer).unwrap();
    (asserter, wallet, controller)
}

#[tokio::test]
async fn refresh_reads_through_eth_call() {
    let (asserter, _, controller) = rpc_controller(MockWallet::new(ALICE));
    asserter.push_success(&uint_output(U256::from(41)));
    assert_eq!(controller.refresh().await.unwrap(), U256::from(41));

    asserter.push_failure_msg("execution reverted");
    let err = controller.refresh().await.unwrap_err();
    assert!(matches!(err, ControllerError::NetworkUnavailable(_)), "{err}");
    assert_eq!(controller.snapshot().counter.value, U256::from(41));
}

#[tokio::test]
async fn increment_signs_confirms_and_reads_back() {
    let (asserter, wallet, controller) = rpc_controller(MockWallet::new(ALICE));
    controller.connect().await.unwrap();

    let tx_hash = TxHash::with_last_byte(1);
    let contract = counter().address();
    asserter.push_success(&receipt(tx_hash, ALICE, contract, true));
    asserter.push_success(&uint_output(U256::from(8)));

    assert_eq!(controller.increment().await.unwrap(), U256::from(8));
    assert_eq!(wallet.last_hash(), Some(tx_hash));

    let call = wallet.calls().remove(0);
    assert_eq!(call.to, contract);
    assert_eq!(call.chain_id, Some(31337));
    assert_eq!(call.input.as_ref(), &[0xd0, 0x9d, 0xe0, 0x8a]);
}

#[tokio::test]
async fn reverted_write_keeps_the_value() {
    let (asserter, _, controller) = rpc_controller(MockWallet::new(ALICE));
    asserter.push_success(&uint_output(U256::from(3)));
    controller.refresh().await.unwrap();
    controller.connect().await.unwrap();

    let tx_hash = TxHash::with_last_byte(1);
    asserter.push_success(&receipt(tx_hash, ALICE, counter().address(), false));

    let err = controller.set_value("10").await.unwrap_err();
    assert_eq!(err, ControllerError::ExecutionReverted { tx_hash });
    let snapshot = controller.snapshot();
    assert_eq!(snapshot.counter.value, U256::from(3));
    assert!(!snapshot.busy);
}
