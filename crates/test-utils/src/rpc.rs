//! Mocked RPC helpers.

use alloy_network::Ethereum;
use alloy_primitives::{Address, Bytes, TxHash, U256};
use alloy_provider::{Provider, ProviderBuilder};
use alloy_transport::mock::Asserter;
use tally_common::RpcProvider;

/// A provider answering from `asserter`'s queue.
pub fn mocked_provider() -> (Asserter, RpcProvider) {
    let asserter = Asserter::new();
    let provider = ProviderBuilder::<_, _, Ethereum>::default()
        .connect_mocked_client(asserter.clone())
        .erased();
    (asserter, provider)
}

/// The `eth_call` result of a function returning a single `uint256`.
pub fn uint_output(value: U256) -> Bytes {
    value.to_be_bytes::<32>().into()
}

/// An `eth_getTransactionReceipt` result for a transaction mined in block 3.
pub fn receipt(tx_hash: TxHash, from: Address, to: Address, status: bool) -> serde_json::Value {
    serde_json::json!({
        "type": "0x2",
        "status": if status { "0x1" } else { "0x0" },
        "cumulativeGasUsed": "0xa8c0",
        "logs": [],
        "logsBloom": format!("0x{}", "0".repeat(512)),
        "transactionHash": tx_hash,
        "transactionIndex": "0x0",
        "blockHash": TxHash::with_last_byte(0xbb),
        "blockNumber": "0x3",
        "gasUsed": "0xa8c0",
        "effectiveGasPrice": "0x3b9aca00",
        "from": from,
        "to": to,
        "contractAddress": null,
    })
}
