//! Read-only contract queries.

use alloy_dyn_abi::DynSolValue;
use alloy_network::TransactionBuilder;
use alloy_primitives::U256;
use alloy_provider::Provider;
use alloy_rpc_types::TransactionRequest;
use async_trait::async_trait;
use tally_common::{ContractDescriptor, ControllerError, Mutability, RpcProvider};

/// Queries the chain for the result of a read-only contract function.
#[async_trait]
pub trait ReadClient: Send + Sync {
    /// Calls `function` on `contract` and decodes its single integer output.
    ///
    /// `function` must be read-only and take no inputs.
    async fn read_value(
        &self,
        contract: &ContractDescriptor,
        function: &str,
    ) -> Result<U256, ControllerError>;
}

/// A [`ReadClient`] that executes `eth_call` against an RPC node.
#[derive(Clone, Debug)]
pub struct RpcReadClient {
    provider: RpcProvider,
}

impl RpcReadClient {
    pub fn new(provider: RpcProvider) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl ReadClient for RpcReadClient {
    async fn read_value(
        &self,
        contract: &ContractDescriptor,
        function: &str,
    ) -> Result<U256, ControllerError> {
        let signature = contract.resolve(function, Mutability::ReadOnly)?;
        if !signature.inputs.is_empty() {
            return Err(ControllerError::mismatch(
                function,
                format!("takes {} input(s), reads take none", signature.inputs.len()),
            ));
        }

        let tx = TransactionRequest::default()
            .with_to(contract.address())
            .with_input(signature.encode_call(&[])?);
        trace!(to = %contract.address(), %signature, "eth_call");

        let output = self.provider.call(tx).await.map_err(ControllerError::from_read_error)?;
        trace!(%output, "eth_call output");

        match signature.decode_output(&output)?.as_slice() {
            [DynSolValue::Uint(value, _)] => Ok(*value),
            other => Err(ControllerError::DecodingError(format!(
                "`{function}` returned {other:?}, expected a single unsigned integer"
            ))),
        }
    }
}
