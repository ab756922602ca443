//! Subcommands of the `tally` binary.

use alloy_provider::Provider;
use eyre::Result;
use std::sync::Arc;
use tally::{
    ConnectionController, ControllerSnapshot, InteractionController, RpcController, RpcReadClient,
    RpcWriteClient,
};
use tally_cli::{opts::EthereumOpts, utils};
use tally_common::{ChainDescriptor, ContractDescriptor};
use yansi::Paint;

pub mod console;
pub mod counter;

/// Wires a controller from the command line options and the loaded config.
pub async fn build_controller(eth: &EthereumOpts) -> Result<(ChainDescriptor, RpcController)> {
    let config = eth.load_config()?;
    let chain = ChainDescriptor::from_config(&config)?;
    let contract = ContractDescriptor::from_config(&config)?;
    let provider = utils::get_provider(&config)?;

    match provider.get_chain_id().await {
        Ok(id) if id != chain.id() => warn!(
            expected = chain.id(),
            actual = id,
            "the rpc endpoint serves a different chain than configured"
        ),
        Ok(_) => {}
        Err(err) => warn!(%err, "could not fetch the chain id of the rpc endpoint"),
    }

    let wallet = eth.wallet.wallet(&config, &provider).await?;
    let connection = ConnectionController::new(wallet);
    let reader = RpcReadClient::new(provider.clone());
    let writer = RpcWriteClient::new(provider, connection.session_view())
        .with_chain_id(chain.id())
        .with_confirmations(config.confirmations)
        .with_timeout(config.confirmation_timeout());

    let controller = InteractionController::new(&contract, connection, reader, writer)?;
    debug!(
        chain = %chain.display_name(),
        contract = %controller.contract().address(),
        "controller ready"
    );
    Ok((chain, controller))
}

/// Logs every state transition until the controller is dropped.
pub fn trace_transitions(controller: &Arc<RpcController>) {
    let mut rx = controller.subscribe();
    tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let snapshot = rx.borrow_and_update().clone();
            debug!(
                phase = %snapshot.phase,
                busy = snapshot.busy,
                connection = %snapshot.connection,
                value = %snapshot.counter.value,
                "state"
            );
        }
    });
}

/// Renders a snapshot for humans.
pub fn render(snapshot: &ControllerSnapshot) -> String {
    let mut out = format!(
        "counter: {}\nwallet:  {}\nphase:   {}",
        snapshot.counter.value.bold(),
        snapshot.connection,
        snapshot.phase
    );
    if let Some(pending) = &snapshot.counter.pending_operation {
        out.push_str(&format!("\npending: {:?}", pending.kind));
        if let Some(value) = pending.requested_value {
            out.push_str(&format!(" to {value}"));
        }
        if let Some(hash) = pending.tx_hash {
            out.push_str(&format!(" ({hash})"));
        }
    }
    if let Some(err) = &snapshot.last_error {
        out.push_str(&format!("\nerror:   {}", err.red()));
    }
    out
}
