//! Shared fixtures.

use std::sync::Arc;
use tally::{ConnectionController, InteractionController};
use tally_common::ContractDescriptor;
use tally_test_utils::{ALICE, COUNTER_ADDRESS, MockReader, MockWallet, MockWriter};

pub type MockController = InteractionController<MockReader, MockWriter>;

/// A controller over scripted clients and a mock wallet.
pub struct Harness {
    pub controller: Arc<MockController>,
    pub reader: MockReader,
    pub writer: MockWriter,
    pub wallet: Arc<MockWallet>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_wallet(MockWallet::new(ALICE))
    }

    pub fn with_wallet(wallet: MockWallet) -> Self {
        tally_test_utils::init_tracing();
        let wallet = Arc::new(wallet);
        let reader = MockReader::new();
        let writer = MockWriter::new();
        let connection = ConnectionController::new(Some(wallet.clone()));
        let controller =
            InteractionController::new(&counter(), connection, reader.clone(), writer.clone())
                .unwrap();
        Self { controller: Arc::new(controller), reader, writer, wallet }
    }

    /// A harness whose wallet is already connected as [`ALICE`].
    pub async fn connected() -> Self {
        let harness = Self::new();
        harness.controller.connect().await.unwrap();
        harness
    }
}

pub fn counter() -> ContractDescriptor {
    ContractDescriptor::counter(COUNTER_ADDRESS).unwrap()
}
